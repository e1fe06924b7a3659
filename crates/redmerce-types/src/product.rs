//! Product records returned by the recommendation backend.
//!
//! Products come from several upstream sources (search summaries, shopping
//! enrichment, older backend builds), so every field except `name` may be
//! missing and fields may carry the wrong JSON type. Deserialization never
//! fails on a bad field; it drops it. Unknown keys are kept in `extra` so the
//! product can be sent back in `current_products` without losing data.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Currency assumed when a product does not name one.
pub const DEFAULT_CURRENCY: &str = "EUR";

/// Number of features shown on a card before collapsing into "+N more".
pub const FEATURE_PREVIEW_LIMIT: usize = 3;

/// Snake-case keys emitted by the shopping enrichment step, mapped onto the
/// camel-case keys the client uses.
const KEY_ALIASES: &[(&str, &str)] = &[
    ("image_url", "imageUrl"),
    ("purchase_link", "purchaseLink"),
    ("original_price", "originalPrice"),
];

/// A value the backend sends either as a JSON number or as preformatted text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(f64),
    Text(String),
}

impl NumberOrText {
    /// Numeric reading of the value, parsing text like `"1.299,00 €"`.
    pub fn amount(&self) -> Option<f64> {
        match self {
            NumberOrText::Number(n) if n.is_finite() => Some(*n),
            NumberOrText::Number(_) => None,
            NumberOrText::Text(s) => parse_amount(s),
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, NumberOrText::Text(s) if s.trim().is_empty())
    }
}

/// One recommended item
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub price: Option<NumberOrText>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(
        rename = "originalPrice",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub original_price: Option<NumberOrText>,
    #[serde(
        rename = "imageUrl",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(
        rename = "purchaseLink",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub purchase_link: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, deserialize_with = "lenient_list", skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub rating: Option<NumberOrText>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub reviews: Option<NumberOrText>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub shipping: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Fields this client does not interpret, kept for the round trip
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Product {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Build a product from an arbitrary JSON value.
    ///
    /// Returns `None` for anything that is not a JSON object.
    pub fn from_value(value: Value) -> Option<Self> {
        let Value::Object(mut obj) = value else {
            return None;
        };
        // When both spellings are present the camel-case value wins and the
        // snake-case one stays in `extra`.
        for (snake, camel) in KEY_ALIASES {
            if obj.contains_key(*camel) {
                continue;
            }
            if let Some(v) = obj.remove(*snake) {
                obj.insert((*camel).to_string(), v);
            }
        }
        serde_json::from_value(Value::Object(obj)).ok()
    }

    /// Image to show on the card: `imageUrl`, then `image`, then `thumbnail`.
    pub fn image(&self) -> Option<&str> {
        first_present(&[&self.image_url, &self.image, &self.thumbnail])
    }

    /// Purchase target: `url`, then `purchaseLink`, then `link`.
    /// `None` disables the purchase action and saving.
    pub fn purchase_link(&self) -> Option<&str> {
        first_present(&[&self.url, &self.purchase_link, &self.link])
    }

    pub fn currency(&self) -> &str {
        self.currency
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CURRENCY)
    }

    pub fn price_amount(&self) -> Option<f64> {
        self.price.as_ref().and_then(NumberOrText::amount)
    }

    /// Display price. Numeric prices are formatted with the product currency;
    /// text prices are assumed to be formatted already.
    pub fn formatted_price(&self) -> Option<String> {
        self.price.as_ref().and_then(|p| self.format_value(p))
    }

    /// Strike-through price, present only when it exceeds the current price.
    pub fn formatted_original_price(&self) -> Option<String> {
        let original = self.original_price.as_ref()?;
        let was = original.amount()?;
        let now = self.price_amount()?;
        if was > now {
            self.format_value(original)
        } else {
            None
        }
    }

    /// Numeric rating; absent or empty ratings hide the rating UI.
    pub fn rating_value(&self) -> Option<f64> {
        self.rating.as_ref().and_then(NumberOrText::amount)
    }

    pub fn reviews_label(&self) -> Option<String> {
        match self.reviews.as_ref()? {
            NumberOrText::Number(n) => Some(format!("{} reviews", n.round() as i64)),
            NumberOrText::Text(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            NumberOrText::Text(_) => None,
        }
    }

    /// The first few features plus a "+N more" note for the rest.
    pub fn feature_preview(&self) -> (&[String], Option<String>) {
        let shown = self.features.len().min(FEATURE_PREVIEW_LIMIT);
        let hidden = self.features.len() - shown;
        let more = (hidden > 0).then(|| format!("+{} more", hidden));
        (&self.features[..shown], more)
    }

    fn format_value(&self, value: &NumberOrText) -> Option<String> {
        match value {
            NumberOrText::Number(n) if n.is_finite() => Some(format_amount(*n, self.currency())),
            NumberOrText::Number(_) => None,
            NumberOrText::Text(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            NumberOrText::Text(_) => None,
        }
    }
}

/// Format an amount with a currency symbol when one is known, else the code.
pub fn format_amount(amount: f64, currency: &str) -> String {
    match currency.to_ascii_uppercase().as_str() {
        "EUR" => format!("€{:.2}", amount),
        "USD" => format!("${:.2}", amount),
        "GBP" => format!("£{:.2}", amount),
        other => format!("{:.2} {}", amount, other),
    }
}

/// Parse a human-formatted price such as `"€1,299.00"`, `"1.299,00 €"` or
/// `"129,99"`. Returns `None` when no digits are present.
pub fn parse_amount(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let last_dot = cleaned.rfind('.');
    let last_comma = cleaned.rfind(',');
    let decimal = match (last_dot, last_comma) {
        (Some(d), Some(c)) => Some(d.max(c)),
        (Some(i), None) | (None, Some(i)) => {
            let sep = cleaned.as_bytes()[i] as char;
            let single = cleaned.matches(sep).count() == 1;
            let tail = cleaned.len() - i - 1;
            // "0.999" has no thousands to group
            let zero_int = cleaned[..i].chars().all(|c| c == '0');
            (single && (tail != 3 || zero_int)).then_some(i)
        }
        (None, None) => None,
    };

    let normalized: String = cleaned
        .char_indices()
        .filter_map(|(i, c)| match c {
            '.' | ',' if Some(i) == decimal => Some('.'),
            '.' | ',' => None,
            _ => Some(c),
        })
        .collect();
    normalized.parse().ok()
}

fn first_present<'a>(candidates: &[&'a Option<String>]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|c| c.as_deref())
        .map(str::trim)
        .find(|s| !s.is_empty())
}

// ─── Lenient field deserializers ─────────────────────────────

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Value::String(s) if !s.trim().is_empty() => vec![s],
        _ => Vec::new(),
    })
}
