use criterion::{Criterion, criterion_group, criterion_main};
use pvbom::models::{
    CoefficientSet, Configuration, InverterEntry, Material, MaterialCatalog, ModuleRow, RoofType,
    Selection, StringEntry,
};
use pvbom::services::{BomCompiler, consolidate};
use std::hint::black_box;

fn catalog() -> MaterialCatalog {
    vec![
        Material::new("MOD-430", "Module 430 W", "module")
            .with_spec("module_length_mm", 1700.0)
            .with_spec("module_width_mm", 1100.0),
        Material::new("INV-10K", "Hybrid inverter 10 kW", "inverter")
            .with_spec("max_ac_current_a", "16,0")
            .with_spec("dongle_integrated", "nein"),
        Material::new("WB-11", "Wallbox 11 kW", "wallbox").with_spec("max_current_a", 16.0),
        Material::new("BKP-3P", "Backup box", "backup").with_spec("max_current_a", 50.0),
        Material::new("RAIL-PROFILE-6000", "Rail profile 6 m", "mounting")
            .with_spec("profile_length_mm", 6000.0),
        Material::new("END-CLAMP-35", "End clamp", "mounting").with_spec("clamp_width_mm", 30.0),
        Material::new("MID-CLAMP-35", "Mid clamp", "mounting").with_spec("clamp_width_mm", 20.0),
    ]
    .into()
}

fn configuration(rows: u32) -> Configuration {
    let coefficients = CoefficientSet::default();
    let mut config = Configuration::with_defaults(&coefficients);
    config.module = Some("MOD-430".to_string());
    config.roof = Some(RoofType::Tile);
    config.layout.portrait = (0..rows).map(|_| ModuleRow::new(12)).collect();
    config.inverters = (0..rows.div_ceil(2))
        .map(|i| {
            let strings = (0..2u32.min(rows - i * 2))
                .map(|j| StringEntry::new(format!("S{}", i * 2 + j), 12))
                .collect();
            InverterEntry::new("INV-10K", 1, strings)
        })
        .collect();
    config.options.wallbox = Some(Selection::new("WB-11", 1));
    config.options.backup = Some(Selection::new("BKP-3P", 1));
    config
}

fn bench_compile(c: &mut Criterion) {
    let catalog = catalog();
    let coefficients = CoefficientSet::default();
    let compiler = BomCompiler::new();

    let small = configuration(2);
    c.bench_function("compile_residential", |b| {
        b.iter(|| compiler.compile(black_box(&small), &catalog, &coefficients))
    });

    let large = configuration(40);
    c.bench_function("compile_commercial", |b| {
        b.iter(|| compiler.compile(black_box(&large), &catalog, &coefficients))
    });
}

fn bench_consolidate(c: &mut Criterion) {
    let catalog = catalog();
    let coefficients = CoefficientSet::default();
    let lines = BomCompiler::new().compile(&configuration(10), &catalog, &coefficients).lines;
    let doubled: Vec<_> = lines.iter().chain(lines.iter()).cloned().collect();

    c.bench_function("consolidate_duplicates", |b| {
        b.iter(|| consolidate(black_box(doubled.clone())))
    });
}

criterion_group!(benches, bench_compile, bench_consolidate);
criterion_main!(benches);
