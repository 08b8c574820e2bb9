// Furniture catalog and the per-family selection used by the compositor.

use std::collections::BTreeMap;

use thiserror::Error;

/// Options offered in every family.
pub const OPTIONS_PER_FAMILY: usize = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("mueble desconocido: {0}")]
    UnknownItem(String),
}

/// Product families, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FurnitureFamily {
    Sofas,
    Chairs,
    Tables,
    Decor,
}

impl FurnitureFamily {
    pub const ALL: [FurnitureFamily; 4] = [
        FurnitureFamily::Sofas,
        FurnitureFamily::Chairs,
        FurnitureFamily::Tables,
        FurnitureFamily::Decor,
    ];

    pub fn id(self) -> &'static str {
        match self {
            FurnitureFamily::Sofas => "sofas",
            FurnitureFamily::Chairs => "chairs",
            FurnitureFamily::Tables => "tables",
            FurnitureFamily::Decor => "decor",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FurnitureFamily::Sofas => "Sofás",
            FurnitureFamily::Chairs => "Sillones",
            FurnitureFamily::Tables => "Mesas",
            FurnitureFamily::Decor => "Decoración",
        }
    }

    /// Prefix of option ids in this family (`sofa-3`).
    fn option_prefix(self) -> &'static str {
        match self {
            FurnitureFamily::Sofas => "sofa",
            FurnitureFamily::Chairs => "chair",
            FurnitureFamily::Tables => "table",
            FurnitureFamily::Decor => "decor",
        }
    }

    fn option_name(self, n: usize) -> String {
        match self {
            FurnitureFamily::Sofas => format!("Sofá {n}"),
            FurnitureFamily::Chairs => format!("Sillón {n}"),
            FurnitureFamily::Tables => format!("Mesa {n}"),
            FurnitureFamily::Decor => format!("Decoración {n}"),
        }
    }

    fn option_prompt(self, n: usize) -> String {
        match self {
            FurnitureFamily::Sofas => format!("a modern sofa model S-{n}"),
            FurnitureFamily::Chairs => format!("a stylish armchair model C-{n}"),
            FurnitureFamily::Tables => format!("a minimalist coffee table model T-{n}"),
            FurnitureFamily::Decor => {
                format!("a decorative element, like a vase or lamp, model D-{n}")
            }
        }
    }

    /// The family's options, numbered from 1.
    pub fn options(self) -> Vec<FurnitureItem> {
        (1..=OPTIONS_PER_FAMILY)
            .map(|n| FurnitureItem {
                id: format!("{}-{n}", self.option_prefix()),
                name: self.option_name(n),
                prompt: self.option_prompt(n),
                family: self,
            })
            .collect()
    }
}

/// One catalog product. `prompt` is the English fragment sent to the image
/// model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FurnitureItem {
    pub id: String,
    pub name: String,
    pub prompt: String,
    pub family: FurnitureFamily,
}

/// Look up a catalog item by id (`chair-4`).
pub fn find_item(id: &str) -> Option<FurnitureItem> {
    let id = id.trim();
    FurnitureFamily::ALL
        .iter()
        .flat_map(|f| f.options())
        .find(|item| item.id == id)
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// At most one item per family. Items come back in family order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FurnitureSelection {
    slots: BTreeMap<FurnitureFamily, FurnitureItem>,
}

impl FurnitureSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a selection from item ids; later ids replace earlier ones of the
    /// same family.
    pub fn from_ids<I, S>(ids: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selection = Self::new();
        for id in ids {
            let id = id.as_ref();
            let item = find_item(id).ok_or_else(|| CatalogError::UnknownItem(id.to_string()))?;
            selection.select(item);
        }
        Ok(selection)
    }

    /// Put `item` in its family's slot, returning the item it replaced.
    pub fn select(&mut self, item: FurnitureItem) -> Option<FurnitureItem> {
        self.slots.insert(item.family, item)
    }

    pub fn clear(&mut self, family: FurnitureFamily) -> Option<FurnitureItem> {
        self.slots.remove(&family)
    }

    pub fn get(&self, family: FurnitureFamily) -> Option<&FurnitureItem> {
        self.slots.get(&family)
    }

    pub fn items(&self) -> Vec<&FurnitureItem> {
        self.slots.values().collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
