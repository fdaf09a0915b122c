//! Consultant model
//!
//! External service providers (engineers, surveyors, planners, builders) who
//! submit quotes against projects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::ConsultantId;

/// An external service provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consultant {
    pub id: ConsultantId,

    pub name: String,

    pub company: Option<String>,

    pub email: Option<String>,

    pub phone: Option<String>,

    /// Service category used by recommendations (e.g., "Civil Engineering")
    pub category: Option<String>,

    /// Scopes of work this consultant typically covers
    #[serde(default)]
    pub typical_scopes: Vec<String>,

    /// 1-5
    pub quality_rating: Option<u8>,

    /// 1-5
    pub reliability_rating: Option<u8>,

    /// 1-5, higher means cheaper
    pub cost_rating: Option<u8>,

    #[serde(default)]
    pub notes: String,

    /// Cleared by a delete; consultants are never removed outright
    pub is_active: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Consultant {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ConsultantId::default(),
            name: name.into(),
            company: None,
            email: None,
            phone: None,
            category: None,
            typical_scopes: Vec::new(),
            quality_rating: None,
            reliability_rating: None,
            cost_rating: None,
            notes: String::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<(), ConsultantValidationError> {
        if self.name.trim().is_empty() {
            return Err(ConsultantValidationError::EmptyName);
        }

        let ratings = [
            ("quality", self.quality_rating),
            ("reliability", self.reliability_rating),
            ("cost", self.cost_rating),
        ];
        for (label, rating) in ratings {
            if let Some(value) = rating {
                if !(1..=5).contains(&value) {
                    return Err(ConsultantValidationError::RatingOutOfRange(label, value));
                }
            }
        }

        if let Some(email) = &self.email {
            if !email.is_empty() && !email.contains('@') {
                return Err(ConsultantValidationError::InvalidEmail(email.clone()));
            }
        }

        Ok(())
    }

    /// Rating normalised to 0..=1, with a missing rating counting as 0
    pub fn normalised_rating(rating: Option<u8>) -> f64 {
        rating.map(|r| f64::from(r) / 5.0).unwrap_or(0.0)
    }
}

impl fmt::Display for Consultant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.company {
            Some(company) => write!(f, "{} ({})", self.name, company),
            None => write!(f, "{}", self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsultantValidationError {
    EmptyName,
    RatingOutOfRange(&'static str, u8),
    InvalidEmail(String),
}

impl fmt::Display for ConsultantValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Consultant name cannot be empty"),
            Self::RatingOutOfRange(label, value) => {
                write!(f, "{} rating must be between 1 and 5 (got {})", label, value)
            }
            Self::InvalidEmail(email) => write!(f, "Invalid email address: {}", email),
        }
    }
}

impl std::error::Error for ConsultantValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_range() {
        let mut consultant = Consultant::new("Jane Smith");
        consultant.quality_rating = Some(5);
        assert!(consultant.validate().is_ok());

        consultant.cost_rating = Some(0);
        assert_eq!(
            consultant.validate(),
            Err(ConsultantValidationError::RatingOutOfRange("cost", 0))
        );

        consultant.cost_rating = Some(6);
        assert!(consultant.validate().is_err());
    }

    #[test]
    fn test_email_check() {
        let mut consultant = Consultant::new("Jane Smith");
        consultant.email = Some("jane.example.com".into());
        assert!(matches!(
            consultant.validate(),
            Err(ConsultantValidationError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_normalised_rating() {
        assert_eq!(Consultant::normalised_rating(Some(4)), 0.8);
        assert_eq!(Consultant::normalised_rating(None), 0.0);
    }
}
