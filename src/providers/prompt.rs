use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ExtractError;

/// Prompt texts are kept in `prompts/*.txt` and embedded at compile time
/// so they can be edited without dealing with Rust string syntax.
const MENU_PROMPT: &str = include_str!("prompts/menu.txt");
const MENU_V2_PROMPT: &str = include_str!("prompts/menu_v2.txt");
const PRODUCT_PROMPT: &str = include_str!("prompts/product.txt");
const NFE_PROMPT: &str = include_str!("prompts/nfe.txt");

/// Which extraction prompt and record schema is sent to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    #[default]
    Menu,
    MenuV2,
    Product,
    /// Brazilian electronic invoice (nota fiscal eletrônica)
    Nfe,
}

impl AnalysisType {
    pub const ALL: [AnalysisType; 4] = [
        AnalysisType::Menu,
        AnalysisType::MenuV2,
        AnalysisType::Product,
        AnalysisType::Nfe,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisType::Menu => "menu",
            AnalysisType::MenuV2 => "menu_v2",
            AnalysisType::Product => "product",
            AnalysisType::Nfe => "nfe",
        }
    }

    pub fn prompt(&self) -> &'static str {
        match self {
            AnalysisType::Menu => MENU_PROMPT,
            AnalysisType::MenuV2 => MENU_V2_PROMPT,
            AnalysisType::Product => PRODUCT_PROMPT,
            AnalysisType::Nfe => NFE_PROMPT,
        }
        .trim()
    }

    pub fn description(&self) -> &'static str {
        match self {
            AnalysisType::Menu => "Full menu analysis",
            AnalysisType::MenuV2 => "Full menu analysis - v2",
            AnalysisType::Product => "Specific product analysis",
            AnalysisType::Nfe => "NFE analysis",
        }
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisType {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnalysisType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ExtractError::UnknownAnalysisType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_are_embedded() {
        for analysis in AnalysisType::ALL {
            assert!(!analysis.prompt().is_empty());
            assert!(analysis.prompt().contains("JSON"));
        }
    }

    #[test]
    fn test_prompts_ask_for_schema_fields() {
        assert!(AnalysisType::Menu.prompt().contains("price"));
        assert!(AnalysisType::Product.prompt().contains("codigo"));
        assert!(AnalysisType::Nfe.prompt().contains("quantidade"));
    }

    #[test]
    fn test_parse_round_trips_names() {
        for analysis in AnalysisType::ALL {
            assert_eq!(analysis.as_str().parse::<AnalysisType>().unwrap(), analysis);
        }
        assert_eq!("MENU_V2".parse::<AnalysisType>().unwrap(), AnalysisType::MenuV2);
    }

    #[test]
    fn test_parse_unknown() {
        let err = "receipt".parse::<AnalysisType>().unwrap_err();
        assert!(err.to_string().contains("receipt"));
    }

    #[test]
    fn test_serde_names_match_wire_format() {
        let json = serde_json::to_string(&AnalysisType::MenuV2).unwrap();
        assert_eq!(json, "\"menu_v2\"");
        let parsed: AnalysisType = serde_json::from_str("\"nfe\"").unwrap();
        assert_eq!(parsed, AnalysisType::Nfe);
    }
}
