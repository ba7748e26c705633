use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which kind of customer is walking the funnel.
///
/// Stored lowercase in the database; the hook payloads use the same
/// wire form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerType {
    New,
    Existing,
}

impl CustomerType {
    pub fn as_str(self) -> &'static str {
        match self {
            CustomerType::New => "new",
            CustomerType::Existing => "existing",
        }
    }
}

impl FromStr for CustomerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(CustomerType::New),
            "existing" => Ok(CustomerType::Existing),
            _ => Err(format!("Unknown customer type: {}", s)),
        }
    }
}

impl fmt::Display for CustomerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One customer's walk through the funnel.
///
/// The id arrives in the funnel link and the row is created on first
/// touch. Uploaded file bytes are never stored here, only delivery
/// bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    /// None until the customer picks a type
    pub customer_type: Option<CustomerType>,
    /// Design files already exist upstream; the upload step is skipped
    pub design_attached: bool,
    /// Checkout link delivered by the pipeline (or synthesized locally)
    pub payment_url: Option<String>,
    /// True when payment_url was synthesized instead of delivered
    pub payment_url_degraded: bool,
    pub files_delivered: bool,
    pub file_count: i64,
    pub completed: bool,
    /// Order reference from the pay-later hook
    pub order_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_type_round_trips_through_strings() {
        assert_eq!("new".parse::<CustomerType>().unwrap(), CustomerType::New);
        assert_eq!(
            "existing".parse::<CustomerType>().unwrap(),
            CustomerType::Existing
        );
        assert!("wholesale".parse::<CustomerType>().is_err());
        assert_eq!(CustomerType::New.to_string(), "new");
    }

    #[test]
    fn test_customer_type_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&CustomerType::Existing).unwrap(),
            "\"existing\""
        );
    }
}
