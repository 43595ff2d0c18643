// benches/normalize.rs
use criterion::{Criterion, black_box, criterion_group, criterion_main};

use fine_scrape::core::{absolute_url, parse_amount_eur, parse_decision_date};
use fine_scrape::specs::HeaderMap;

const AMOUNTS: &[&str] = &["1.234,56 €", "10.000 €", "20,000,000", "€ 3 500", "42", "unknown", ""];
const DATES: &[&str] = &["05/03/2021", "2020-07-14", "1 March 2021", "03.02.22", "2019-12-01T00:00:00", "n/a"];
const HEADERS: &[&str] = &[
    "View", "ETId", "Country", "Date of decision", "Fine [€]",
    "Controller/processor", "Quoted Art.", "Type", "Source",
];

fn bench_normalize(c: &mut Criterion) {
    c.bench_function("parse_amount_eur", |b| {
        b.iter(|| AMOUNTS.iter().filter_map(|a| parse_amount_eur(black_box(a))).count())
    });

    c.bench_function("parse_decision_date", |b| {
        b.iter(|| DATES.iter().filter_map(|d| parse_decision_date(black_box(d))).count())
    });

    c.bench_function("absolute_url", |b| {
        b.iter(|| absolute_url(black_box("/ETid-2342"), black_box("https://www.enforcementtracker.com/")))
    });

    c.bench_function("header_resolve", |b| {
        b.iter(|| HeaderMap::resolve(black_box(HEADERS)))
    });
}

criterion_group!(benches, bench_normalize);
criterion_main!(benches);
