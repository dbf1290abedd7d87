//! Global-symbol catalog
//!
//! A catalog pairs one buffer of concatenated modules with a JSON index:
//!
//! ```json
//! [{"name": "flash/display.abc", "offset": 0, "length": 312, "defs": ["flash.display.Sprite"]}]
//! ```
//!
//! Modules are decoded on demand when one of their symbols is first needed.

use crate::error::CatalogError;
use crate::module::AbcFile;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One module stored in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Entry name, used as the module label
    pub name: String,
    /// Byte offset into the module buffer
    pub offset: usize,
    /// Byte length of the module
    pub length: usize,
    /// Symbols the module defines
    #[serde(default)]
    pub defs: Vec<String>,
}

/// Lazily decoded catalog of modules keyed by the symbols they define
#[derive(Debug)]
pub struct AbcCatalog {
    abcs: Vec<u8>,
    entries: Vec<CatalogEntry>,
    symbols: HashMap<String, usize>,
}

impl AbcCatalog {
    /// Build a catalog from the module buffer and its JSON index.
    ///
    /// When two entries define the same symbol the earlier entry wins.
    ///
    /// # Errors
    ///
    /// Fails when the index is not valid JSON or an entry lies outside `abcs`.
    pub fn new(abcs: Vec<u8>, index_json: &str) -> Result<Self, CatalogError> {
        let entries: Vec<CatalogEntry> = serde_json::from_str(index_json)?;
        let mut symbols = HashMap::new();
        for (index, entry) in entries.iter().enumerate() {
            let end = entry.offset.checked_add(entry.length);
            if end.map_or(true, |end| end > abcs.len()) {
                return Err(CatalogError::OutOfRange {
                    name: entry.name.clone(),
                    offset: entry.offset,
                    length: entry.length,
                    size: abcs.len(),
                });
            }
            for def in &entry.defs {
                symbols.entry(def.clone()).or_insert(index);
            }
        }
        Ok(Self {
            abcs,
            entries,
            symbols,
        })
    }

    /// Index entries in file order
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Index of the entry defining `symbol`
    pub fn entry_for_symbol(&self, symbol: &str) -> Option<usize> {
        self.symbols.get(symbol).copied()
    }

    /// Whether any entry defines `symbol`
    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.contains_key(symbol)
    }

    /// All symbols, sorted
    pub fn symbols(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.symbols.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Raw bytes of entry `index`
    pub fn entry_bytes(&self, index: usize) -> Option<&[u8]> {
        let entry = self.entries.get(index)?;
        self.abcs.get(entry.offset..entry.offset + entry.length)
    }

    /// Decode the module stored at entry `index`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Module`] if the bytes do not decode.
    pub fn load_entry(&self, index: usize) -> Result<AbcFile, CatalogError> {
        let entry = self.entries.get(index).ok_or_else(|| CatalogError::OutOfRange {
            name: format!("#{}", index),
            offset: 0,
            length: 0,
            size: self.abcs.len(),
        })?;
        let bytes = self.entry_bytes(index).unwrap_or_default();
        AbcFile::parse(bytes, entry.name.clone()).map_err(|source| CatalogError::Module {
            name: entry.name.clone(),
            source,
        })
    }
}
