use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single specification attribute value.
///
/// Catalog documents store attributes as yes/no flags, numbers or free text
/// (frequently locale-formatted numbers such as `"1,5"`), so all three shapes
/// are accepted on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpecValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl SpecValue {
    /// True when the value carries no usable content (blank text or NaN).
    pub fn is_empty(&self) -> bool {
        match self {
            SpecValue::Bool(_) => false,
            SpecValue::Number(n) => n.is_nan(),
            SpecValue::Text(s) => s.trim().is_empty(),
        }
    }
}

impl From<bool> for SpecValue {
    fn from(value: bool) -> Self {
        SpecValue::Bool(value)
    }
}

impl From<f64> for SpecValue {
    fn from(value: f64) -> Self {
        SpecValue::Number(value)
    }
}

impl From<&str> for SpecValue {
    fn from(value: &str) -> Self {
        SpecValue::Text(value.to_string())
    }
}

/// Specification attributes of a material, keyed by specification identifier.
pub type MaterialSpecSet = IndexMap<String, SpecValue>;

/// Material record as held by the warehouse catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub category: String,

    /// Unit price at the time the catalog snapshot was taken.
    #[serde(default)]
    pub price: Option<f64>,

    #[serde(default)]
    pub specs: MaterialSpecSet,
}

impl Material {
    pub fn new(id: impl Into<String>, description: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            category: category.into(),
            price: None,
            specs: MaterialSpecSet::new(),
        }
    }

    /// Builder-style helper to attach a specification value.
    pub fn with_spec(mut self, spec_id: impl Into<String>, value: impl Into<SpecValue>) -> Self {
        self.specs.insert(spec_id.into(), value.into());
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }
}

/// Read-only snapshot of the material catalog.
///
/// Lookups never fail: an unknown identifier simply yields `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Material>", into = "Vec<Material>")]
pub struct MaterialCatalog {
    materials: IndexMap<String, Material>,
}

impl MaterialCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a material record.
    pub fn insert(&mut self, material: Material) {
        self.materials.insert(material.id.clone(), material);
    }

    pub fn get(&self, id: &str) -> Option<&Material> {
        self.materials.get(id)
    }

    /// Look up an optional identifier, treating blank identifiers as absent.
    pub fn find(&self, id: Option<&str>) -> Option<&Material> {
        id.filter(|id| !id.trim().is_empty())
            .and_then(|id| self.materials.get(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.materials.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Material> {
        self.materials.values()
    }

    /// All materials belonging to a category, in catalog order.
    pub fn by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Material> + 'a {
        self.materials.values().filter(move |m| m.category == category)
    }
}

impl From<Vec<Material>> for MaterialCatalog {
    fn from(materials: Vec<Material>) -> Self {
        let mut catalog = MaterialCatalog::new();
        for material in materials {
            catalog.insert(material);
        }
        catalog
    }
}

impl From<MaterialCatalog> for Vec<Material> {
    fn from(catalog: MaterialCatalog) -> Self {
        catalog.materials.into_values().collect()
    }
}

impl FromIterator<Material> for MaterialCatalog {
    fn from_iter<T: IntoIterator<Item = Material>>(iter: T) -> Self {
        let mut catalog = MaterialCatalog::new();
        for material in iter {
            catalog.insert(material);
        }
        catalog
    }
}
