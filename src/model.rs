use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::{ExtractError, Result};

pub const PLACEHOLDER_IMAGE: &str = "/images/placeholder.jpg";

/// Image shown next to an item. Extraction never produces real pictures,
/// so this is always the placeholder path unless a client sets one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuImage {
    pub b64_json: String,
}

impl Default for MenuImage {
    fn default() -> Self {
        MenuImage {
            b64_json: PLACEHOLDER_IMAGE.to_string(),
        }
    }
}

/// One extracted line item.
///
/// `price` is kept as display text: models return "R$ 12,50", "12.50",
/// "2 x 5" and so on, and the value is only ever shown or exported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: Uuid,
    #[serde(default)]
    pub codigo: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu_image: Option<MenuImage>,
    /// Fields the model returned that are not part of the item schema
    #[serde(default, flatten)]
    pub extra: BTreeMap<String, Value>,
}

const KNOWN_FIELDS: [&str; 5] = ["codigo", "name", "category", "price", "description"];

impl MenuItem {
    /// Build an item from one record of the model's JSON array, assigning a fresh id.
    pub fn from_record(index: usize, record: &Value) -> Result<Self> {
        let object = record.as_object().ok_or_else(|| {
            ExtractError::Parse(format!(
                "item {} is not a JSON object: {}",
                index, record
            ))
        })?;

        let extra = object
            .iter()
            .filter(|(key, _)| !KNOWN_FIELDS.contains(&key.as_str()) && key.as_str() != "id")
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(MenuItem {
            id: Uuid::new_v4(),
            codigo: text_field(object, "codigo"),
            name: text_field(object, "name"),
            category: text_field(object, "category"),
            price: text_field(object, "price"),
            description: text_field(object, "description"),
            menu_image: Some(MenuImage::default()),
            extra,
        })
    }

    /// Convert a whole parsed array, failing on the first non-object record.
    pub fn from_records(records: &[Value]) -> Result<Vec<Self>> {
        records
            .iter()
            .enumerate()
            .map(|(i, record)| MenuItem::from_record(i, record))
            .collect()
    }

    /// Look up a column by its export name.
    pub fn field(&self, name: &str) -> String {
        match name {
            "codigo" => self.codigo.clone(),
            "name" => self.name.clone(),
            "category" => self.category.clone(),
            "price" => self.price.clone(),
            "description" => self.description.clone(),
            other => self.extra.get(other).map(value_to_text).unwrap_or_default(),
        }
    }

    pub fn apply(&mut self, update: ItemUpdate) {
        if let Some(codigo) = update.codigo {
            self.codigo = codigo;
        }
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
    }
}

/// Edit form for one item; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemUpdate {
    pub codigo: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<String>,
    pub description: Option<String>,
}

fn text_field(object: &Map<String, Value>, key: &str) -> String {
    object.get(key).map(value_to_text).unwrap_or_default()
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_record_fills_missing_fields() {
        let item = MenuItem::from_record(0, &json!({"name": "Coxinha", "price": "R$ 8,00"})).unwrap();
        assert_eq!(item.name, "Coxinha");
        assert_eq!(item.price, "R$ 8,00");
        assert_eq!(item.codigo, "");
        assert_eq!(item.category, "");
        assert_eq!(item.menu_image, Some(MenuImage::default()));
        assert!(item.extra.is_empty());
    }

    #[test]
    fn test_from_record_stringifies_numbers_and_nulls() {
        let item = MenuItem::from_record(
            0,
            &json!({"name": "Pastel", "price": 12.5, "codigo": 42, "description": null}),
        )
        .unwrap();
        assert_eq!(item.price, "12.5");
        assert_eq!(item.codigo, "42");
        assert_eq!(item.description, "");
    }

    #[test]
    fn test_from_record_keeps_unknown_fields() {
        let item = MenuItem::from_record(
            0,
            &json!({"codigo": "001", "referencia": "Parafuso", "quantidade": "10", "valor": "3,50"}),
        )
        .unwrap();
        assert_eq!(item.codigo, "001");
        assert_eq!(item.field("referencia"), "Parafuso");
        assert_eq!(item.field("quantidade"), "10");
        assert_eq!(item.field("missing"), "");
    }

    #[test]
    fn test_from_record_ignores_model_ids() {
        let item = MenuItem::from_record(0, &json!({"id": 7, "name": "Suco"})).unwrap();
        assert!(!item.extra.contains_key("id"));
    }

    #[test]
    fn test_from_records_rejects_non_objects() {
        let err = MenuItem::from_records(&[json!({"name": "ok"}), json!("nope")]).unwrap_err();
        assert!(err.to_string().contains("item 1"));
    }

    #[test]
    fn test_ids_are_unique() {
        let items = MenuItem::from_records(&[json!({"name": "a"}), json!({"name": "a"})]).unwrap();
        assert_ne!(items[0].id, items[1].id);
    }

    #[test]
    fn test_apply_partial_update() {
        let mut item = MenuItem::from_record(0, &json!({"name": "Cafe", "price": "5"})).unwrap();
        item.apply(ItemUpdate {
            price: Some("6".into()),
            category: Some("Bebidas".into()),
            ..Default::default()
        });
        assert_eq!(item.name, "Cafe");
        assert_eq!(item.price, "6");
        assert_eq!(item.category, "Bebidas");
    }

    #[test]
    fn test_serializes_camel_case_with_extras_inline() {
        let item = MenuItem::from_record(0, &json!({"name": "x", "valor": "1"})).unwrap();
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["menuImage"]["b64_json"], PLACEHOLDER_IMAGE);
        assert_eq!(value["valor"], "1");
    }
}
