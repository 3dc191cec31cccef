use std::io::Cursor;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

use adiflog::{
    adif::{Decoder, EncoderOptions, write_adif},
    core::store::MemoryQsoStore,
    import::Importer,
    normalize::{ImportItem, LogDefaults, Normalizer, NormalizerOptions},
    types::Callsign,
};

fn defaults() -> LogDefaults {
    LogDefaults {
        station_callsign: Callsign::parse("N0CALL").expect("call"),
    }
}

fn sample_file(records: usize) -> Vec<u8> {
    let mut out = String::from("Bench export\n<ADIF_VER:5>3.1.4 <EOH>\n");
    for i in 0..records {
        let call = format!("K{}AB", i % 10_000);
        let minute = i % 60;
        let hour = (i / 60) % 24;
        out.push_str(&format!(
            "<CALL:{}>{call} <QSO_DATE:8>20240115 <TIME_ON:4>{hour:02}{minute:02} <MODE:2>CW \
             <FREQ:6>14.025 <RST_SENT:3>599 <RST_RCVD:3>579 <NAME:3>Bob <EOR>\n",
            call.len()
        ));
    }
    out.into_bytes()
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    for records in [1_000usize, 20_000] {
        let bytes = sample_file(records);
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(records), &bytes, |b, bytes| {
            b.iter(|| {
                Decoder::new(Cursor::new(bytes.as_slice()))
                    .expect("decoder")
                    .filter_map(Result::ok)
                    .count()
            });
        });
    }
    group.finish();
}

fn bench_normalize(c: &mut Criterion) {
    let bytes = sample_file(20_000);
    let normalizer = Normalizer::new(defaults(), NormalizerOptions::default());

    c.bench_function("decode_and_normalize_20k", |b| {
        b.iter(|| {
            let decoder = Decoder::new(Cursor::new(bytes.as_slice())).expect("decoder");
            normalizer
                .normalize_all(decoder)
                .filter(|item| matches!(item, Ok(ImportItem::Accepted(_))))
                .count()
        });
    });
}

fn bench_import(c: &mut Criterion) {
    let bytes = sample_file(20_000);
    let importer = Importer::new(defaults());

    c.bench_function("import_memory_store_20k", |b| {
        b.iter(|| {
            let mut store = MemoryQsoStore::new();
            importer
                .import_reader(bytes.as_slice(), &mut store, 1)
                .expect("import")
                .tally
        });
    });
}

fn bench_encode(c: &mut Criterion) {
    let bytes = sample_file(20_000);
    let normalizer = Normalizer::new(defaults(), NormalizerOptions::default());
    let records: Vec<_> = normalizer
        .normalize_all(Decoder::new(Cursor::new(bytes)).expect("decoder"))
        .filter_map(|item| match item {
            Ok(ImportItem::Accepted(qso)) => Some(qso),
            _ => None,
        })
        .collect();
    let options = EncoderOptions::default();

    c.bench_function("encode_20k", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(records.len() * 200);
            write_adif(&records, &options, &mut out).expect("encode")
        });
    });
}

criterion_group!(benches, bench_decode, bench_normalize, bench_import, bench_encode);
criterion_main!(benches);
