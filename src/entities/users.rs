use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account role. Admins bypass ownership checks and plan quotas.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserType {
    #[sea_orm(string_value = "STANDARD")]
    Standard,
    #[sea_orm(string_value = "ADMIN")]
    Admin,
}

impl Default for UserType {
    fn default() -> Self {
        Self::Standard
    }
}

impl UserType {
    /// Parse a route path segment, case-insensitively. `None` for anything
    /// that is not a known type.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "STANDARD" => Some(Self::Standard),
            "ADMIN" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// Payment plan. Limits how many API keys and encounters an account may hold.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentPlan {
    #[sea_orm(string_value = "FREE")]
    Free,
    #[sea_orm(string_value = "ADVENTURER")]
    Adventurer,
    #[sea_orm(string_value = "HERO")]
    Hero,
}

impl Default for PaymentPlan {
    fn default() -> Self {
        Self::Free
    }
}

impl PaymentPlan {
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "FREE" => Some(Self::Free),
            "ADVENTURER" => Some(Self::Adventurer),
            "HERO" => Some(Self::Hero),
            _ => None,
        }
    }

    #[must_use]
    pub const fn api_key_limit(self) -> u64 {
        match self {
            Self::Free => 0,
            Self::Adventurer => 2,
            Self::Hero => 5,
        }
    }

    #[must_use]
    pub const fn encounter_limit(self) -> u64 {
        match self {
            Self::Free => 30,
            Self::Adventurer => 100,
            Self::Hero => 1000,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,

    #[sea_orm(unique)]
    pub email: String,

    /// Argon2id password hash, never serialized to clients
    pub password_hash: String,

    pub user_type: UserType,

    pub payment_plan: PaymentPlan,

    pub locked: bool,

    /// Accounts start disabled and need an admin to enable them.
    pub enabled: bool,

    pub password_last_updated: Date,

    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_limits_per_plan() {
        assert_eq!(PaymentPlan::Free.api_key_limit(), 0);
        assert_eq!(PaymentPlan::Adventurer.api_key_limit(), 2);
        assert_eq!(PaymentPlan::Hero.api_key_limit(), 5);
    }

    #[test]
    fn encounter_limits_per_plan() {
        assert_eq!(PaymentPlan::Free.encounter_limit(), 30);
        assert_eq!(PaymentPlan::Adventurer.encounter_limit(), 100);
        assert_eq!(PaymentPlan::Hero.encounter_limit(), 1000);
    }

    #[test]
    fn parses_path_segments_case_insensitively() {
        assert_eq!(PaymentPlan::from_name("hero"), Some(PaymentPlan::Hero));
        assert_eq!(PaymentPlan::from_name(" FREE "), Some(PaymentPlan::Free));
        assert_eq!(PaymentPlan::from_name("platinum"), None);
        assert_eq!(UserType::from_name("Admin"), Some(UserType::Admin));
        assert_eq!(UserType::from_name("root"), None);
    }

    #[test]
    fn enums_serialize_upper_case() {
        assert_eq!(
            serde_json::to_string(&UserType::Admin).unwrap(),
            "\"ADMIN\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentPlan::Adventurer).unwrap(),
            "\"ADVENTURER\""
        );
    }
}
