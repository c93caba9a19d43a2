use std::time::Instant;

use crate::models::{CoefficientSet, CompiledBom, Configuration, MaterialCatalog};

use super::consolidation::consolidate;
use super::rules::RuleAugmenter;

/// Turns a configuration into a consolidated bill of materials.
///
/// Compilation is pure: it borrows its inputs, never fails and always returns
/// a fresh [`CompiledBom`]. Missing catalog data degrades to zero quantities or
/// skipped lines instead of errors.
#[derive(Debug, Default, Clone, Copy)]
pub struct BomCompiler;

impl BomCompiler {
    pub fn new() -> Self {
        Self
    }

    pub fn compile(
        &self,
        config: &Configuration,
        catalog: &MaterialCatalog,
        coefficients: &CoefficientSet,
    ) -> CompiledBom {
        let started = Instant::now();

        let augmented = RuleAugmenter::new(config, catalog, coefficients).run();
        let raw_lines = augmented.lines.len();
        let lines = consolidate(augmented.lines);

        tracing::debug!(
            "Compiled BOM: {} raw lines consolidated to {}, {} warnings in {:?}",
            raw_lines,
            lines.len(),
            augmented.warnings.len(),
            started.elapsed()
        );

        CompiledBom {
            lines,
            warnings: augmented.warnings,
        }
    }
}

/// Convenience wrapper around [`BomCompiler::compile`].
pub fn compile(
    config: &Configuration,
    catalog: &MaterialCatalog,
    coefficients: &CoefficientSet,
) -> CompiledBom {
    BomCompiler::new().compile(config, catalog, coefficients)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InverterEntry, Material, ModuleLayout, ModuleRow, RoofType, StringEntry};

    fn catalog() -> MaterialCatalog {
        vec![
            Material::new("MOD", "Module 430 W", "module")
                .with_spec("module_length_mm", 1700.0)
                .with_spec("module_width_mm", 1100.0),
            Material::new("INV", "Inverter 10 kW", "inverter")
                .with_spec("max_ac_current_a", 16.0)
                .with_spec("dongle_integrated", "ja"),
        ]
        .into()
    }

    fn config() -> Configuration {
        Configuration {
            module: Some("MOD".to_string()),
            roof: Some(RoofType::Flat),
            layout: ModuleLayout {
                portrait: vec![ModuleRow::new(6), ModuleRow::new(6)],
                landscape: Vec::new(),
            },
            inverters: vec![InverterEntry::new(
                "INV",
                1,
                vec![StringEntry::new("A", 6), StringEntry::new("B", 6)],
            )],
            ..Configuration::with_defaults(&CoefficientSet::default())
        }
    }

    #[test]
    fn test_material_ids_are_unique() {
        let bom = compile(&config(), &catalog(), &CoefficientSet::default());
        let mut ids: Vec<&str> = bom.lines.iter().map(|l| l.material_id.as_str()).collect();
        let before = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), before);
    }

    #[test]
    fn test_duplicate_feed_cable_is_merged() {
        let mut coefficients = CoefficientSet::default();
        // Inverter feed consumable uses the same cable the recommendation picks.
        coefficients.consumables.inverter_feed_cable.material = Some("NYM-J-5X1.5".to_string());

        let bom = compile(&config(), &catalog(), &coefficients);
        assert_eq!(bom.quantity_of("NYM-J-5X1.5"), 20.0);
        assert!(bom.line("NYM-J-5X1.5").unwrap().is_configured);
    }

    #[test]
    fn test_descriptions_come_from_catalog() {
        let bom = compile(&config(), &catalog(), &CoefficientSet::default());
        assert_eq!(bom.line("MOD").unwrap().description, "Module 430 W");
        assert_eq!(bom.line("MCB-B16-3P").unwrap().description, "MCB-B16-3P");
    }

    #[test]
    fn test_compile_is_repeatable() {
        let (config, catalog, coefficients) = (config(), catalog(), CoefficientSet::default());
        let first = compile(&config, &catalog, &coefficients);
        let second = BomCompiler::new().compile(&config, &catalog, &coefficients);
        assert_eq!(first, second);
        assert!(!first.has_warnings());
    }
}
