use actix_web::http::Method;
use chrono::Utc;
use criterion::{Criterion, criterion_group, criterion_main};
use speedtest_ingest::pipeline::decode_body;
use speedtest_ingest::record::build_record;
use speedtest_ingest::{IncomingRequest, StorageKey};

const FORM_BODY: &str = "d=94.21&u=11.87&p=14&jit=2.31&ua=Mozilla%2F5.0+(X11%3B+Linux+x86_64)&dd=125829120&ud=31457280";
const ENCODED_BODY: &str = "ZD05NC4yMSZ1PTExLjg3JnA9MTQmaml0PTIuMzE=";

fn bench_decode(c: &mut Criterion) {
    c.bench_function("decode_plain", |b| {
        b.iter(|| decode_body(FORM_BODY.as_bytes(), false).unwrap())
    });
    c.bench_function("decode_base64", |b| {
        b.iter(|| decode_body(ENCODED_BODY.as_bytes(), true).unwrap())
    });
}

fn bench_build_record(c: &mut Criterion) {
    let request = IncomingRequest::new(Method::POST, FORM_BODY);
    let body = decode_body(FORM_BODY.as_bytes(), false).unwrap();
    let now = Utc::now();
    c.bench_function("build_record", |b| {
        b.iter(|| build_record(&request, body.clone(), now))
    });
}

fn bench_serialize(c: &mut Criterion) {
    let request = IncomingRequest::new(Method::POST, FORM_BODY);
    let body = decode_body(FORM_BODY.as_bytes(), false).unwrap();
    let record = build_record(&request, body, Utc::now());
    c.bench_function("serialize_record", |b| {
        b.iter(|| serde_json::to_vec(&record).unwrap())
    });
    c.bench_function("storage_key", |b| {
        b.iter(|| StorageKey::for_time(&record.time_processed))
    });
}

criterion_group!(benches, bench_decode, bench_build_record, bench_serialize);
criterion_main!(benches);
