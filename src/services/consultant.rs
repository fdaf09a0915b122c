//! Consultant service
//!
//! Consultant CRUD with soft delete, price estimation from past quotes and
//! the weighted recommendation score used when shortlisting for a job.

use chrono::Utc;
use tracing::{debug, info};

use crate::audit::EntityType;
use crate::error::{EstateError, EstateResult};
use crate::models::{Consultant, ConsultantId, Money};
use crate::storage::Storage;

/// Minimum similarity for a required scope to count as covered
const SCOPE_MATCH_THRESHOLD: f64 = 0.6;

/// Number of consultants returned by `recommend`
const MAX_RECOMMENDATIONS: usize = 5;

pub struct ConsultantService<'a> {
    storage: &'a Storage,
}

/// Price range predicted from a consultant's past quotes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceEstimate {
    /// `(low, high)`; `None` with fewer than two usable quotes
    pub range: Option<(Money, Money)>,
    /// Number of quotes the fit used
    pub samples: usize,
}

/// How well a consultant's typical scopes cover the required ones
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeMatch {
    /// Fraction of required scopes covered, 0..=1
    pub match_rate: f64,
    /// (required scope, best matching consultant scope, similarity)
    pub matched: Vec<(String, String, f64)>,
    pub unmatched: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Recommendation {
    pub consultant: Consultant,
    /// Weighted score on a 0-5 scale, two decimal places
    pub score: f64,
    pub scope_match: ScopeMatch,
    pub price: PriceEstimate,
}

impl<'a> ConsultantService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub fn create(&self, mut consultant: Consultant) -> EstateResult<Consultant> {
        consultant.name = consultant.name.trim().to_string();
        consultant.typical_scopes = clean_scopes(consultant.typical_scopes);
        consultant
            .validate()
            .map_err(|e| EstateError::Validation(e.to_string()))?;

        consultant.id = self.storage.consultants().insert(&consultant)?;
        info!(id = %consultant.id, name = %consultant.name, "Created consultant");

        self.storage.log_create(
            EntityType::Consultant,
            consultant.id.to_string(),
            Some(consultant.name.clone()),
            &consultant,
        )?;

        Ok(consultant)
    }

    pub fn get(&self, id: ConsultantId) -> EstateResult<Option<Consultant>> {
        self.storage.consultants().get(id)
    }

    /// Find by consultant name, company name or ID string
    pub fn find(&self, identifier: &str) -> EstateResult<Option<Consultant>> {
        if let Some(consultant) = self.storage.consultants().get_by_name(identifier)? {
            return Ok(Some(consultant));
        }

        if let Ok(id) = identifier.parse::<ConsultantId>() {
            return self.storage.consultants().get(id);
        }

        Ok(None)
    }

    pub fn require(&self, identifier: &str) -> EstateResult<Consultant> {
        self.find(identifier)?
            .ok_or_else(|| EstateError::consultant_not_found(identifier))
    }

    pub fn list(&self, category: Option<&str>, active_only: bool) -> EstateResult<Vec<Consultant>> {
        self.storage.consultants().list(category, active_only)
    }

    pub fn update(&self, mut consultant: Consultant) -> EstateResult<Consultant> {
        let before = self
            .get(consultant.id)?
            .ok_or_else(|| EstateError::consultant_not_found(consultant.id.to_string()))?;

        consultant.name = consultant.name.trim().to_string();
        consultant.typical_scopes = clean_scopes(consultant.typical_scopes);
        consultant
            .validate()
            .map_err(|e| EstateError::Validation(e.to_string()))?;
        consultant.updated_at = Utc::now();
        self.storage.consultants().update(&consultant)?;

        self.storage.log_update(
            EntityType::Consultant,
            consultant.id.to_string(),
            Some(consultant.name.clone()),
            &before,
            &consultant,
        )?;

        Ok(consultant)
    }

    /// Soft delete: the consultant and their quotes stay on record
    pub fn deactivate(&self, id: ConsultantId) -> EstateResult<Consultant> {
        self.set_active(id, false)
    }

    pub fn reactivate(&self, id: ConsultantId) -> EstateResult<Consultant> {
        self.set_active(id, true)
    }

    fn set_active(&self, id: ConsultantId, active: bool) -> EstateResult<Consultant> {
        let before = self
            .get(id)?
            .ok_or_else(|| EstateError::consultant_not_found(id.to_string()))?;

        self.storage.consultants().set_active(id, active)?;
        let after = self
            .get(id)?
            .ok_or_else(|| EstateError::consultant_not_found(id.to_string()))?;
        info!(id = %id, active, "Changed consultant active flag");

        self.storage.log_update(
            EntityType::Consultant,
            id.to_string(),
            Some(after.name.clone()),
            &before,
            &after,
        )?;

        Ok(after)
    }

    /// Predict a quote for a job of `project_size` from a straight-line fit
    /// over the consultant's previous (size, amount) quotes.
    pub fn estimate_price(
        &self,
        id: ConsultantId,
        project_size: f64,
        project_type: Option<&str>,
    ) -> EstateResult<PriceEstimate> {
        let points = self.storage.quotes().size_amount_points(id, project_type)?;
        let samples = points.len();
        let range = linear_fit(&points).map(|(slope, intercept)| {
            let estimate = intercept + slope * project_size;
            (Money::from_f64(estimate * 0.9), Money::from_f64(estimate * 1.1))
        });
        debug!(consultant = %id, samples, ?range, "Estimated price");
        Ok(PriceEstimate { range, samples })
    }

    /// Score active consultants in `category` for a job and return the
    /// best five, highest score first.
    pub fn recommend(
        &self,
        category: Option<&str>,
        project_size: f64,
        required_scopes: &[String],
        project_type: Option<&str>,
    ) -> EstateResult<Vec<Recommendation>> {
        let mut recommendations = Vec::new();

        for consultant in self.list(category, true)? {
            let scope_match = scope_match(&consultant.typical_scopes, required_scopes);
            let price = self.estimate_price(consultant.id, project_size, project_type)?;
            let score = weighted_score(&consultant, scope_match.match_rate, price.samples > 0);
            recommendations.push(Recommendation {
                consultant,
                score,
                scope_match,
                price,
            });
        }

        recommendations.sort_by(|a, b| b.score.total_cmp(&a.score));
        recommendations.truncate(MAX_RECOMMENDATIONS);
        Ok(recommendations)
    }
}

fn clean_scopes(scopes: Vec<String>) -> Vec<String> {
    scopes
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Least-squares slope and intercept; needs at least two points.
///
/// When every point has the same size the line is flat at the mean amount.
fn linear_fit(points: &[(f64, Money)]) -> Option<(f64, f64)> {
    if points.len() < 2 {
        return None;
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y.as_f64()).sum::<f64>() / n;

    let (mut sxy, mut sxx) = (0.0, 0.0);
    for (x, y) in points {
        sxy += (x - mean_x) * (y.as_f64() - mean_y);
        sxx += (x - mean_x).powi(2);
    }

    if sxx.abs() < f64::EPSILON {
        return Some((0.0, mean_y));
    }

    let slope = sxy / sxx;
    Some((slope, mean_y - slope * mean_x))
}

/// Match each required scope against the consultant's typical scopes
pub fn scope_match(typical: &[String], required: &[String]) -> ScopeMatch {
    let mut matched = Vec::new();
    let mut unmatched = Vec::new();

    for req in required {
        let best = typical
            .iter()
            .map(|scope| {
                let similarity =
                    strsim::normalized_levenshtein(&req.to_lowercase(), &scope.to_lowercase());
                (scope, similarity)
            })
            .max_by(|a, b| a.1.total_cmp(&b.1));

        match best {
            Some((scope, similarity)) if similarity > SCOPE_MATCH_THRESHOLD => {
                matched.push((req.clone(), scope.clone(), similarity));
            }
            _ => unmatched.push(req.clone()),
        }
    }

    let match_rate = if required.is_empty() {
        0.0
    } else {
        matched.len() as f64 / required.len() as f64
    };

    ScopeMatch {
        match_rate,
        matched,
        unmatched,
    }
}

fn weighted_score(consultant: &Consultant, scope_rate: f64, has_history: bool) -> f64 {
    let score = scope_rate * 0.35
        + Consultant::normalised_rating(consultant.quality_rating) * 0.25
        + Consultant::normalised_rating(consultant.cost_rating) * 0.20
        + Consultant::normalised_rating(consultant.reliability_rating) * 0.15
        + if has_history { 0.05 } else { 0.0 };
    (score * 5.0 * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Quote;
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    fn consultant(name: &str, category: &str, ratings: (u8, u8, u8), scopes: &[&str]) -> Consultant {
        let mut c = Consultant::new(name);
        c.category = Some(category.into());
        c.quality_rating = Some(ratings.0);
        c.reliability_rating = Some(ratings.1);
        c.cost_rating = Some(ratings.2);
        c.typical_scopes = scopes.iter().map(|s| s.to_string()).collect();
        c
    }

    fn add_quote(storage: &Storage, id: ConsultantId, size: f64, dollars: i64, kind: &str) {
        let mut quote = Quote::new(id, date(), Money::from_dollars(dollars));
        quote.project_size = Some(size);
        quote.project_type = Some(kind.into());
        storage.quotes().insert(&quote).unwrap();
    }

    #[test]
    fn test_create_rejects_bad_rating() {
        let storage = Storage::in_memory().unwrap();
        let err = ConsultantService::new(&storage)
            .create(consultant("A", "Civil", (6, 3, 3), &[]))
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_deactivate_is_soft() {
        let storage = Storage::in_memory().unwrap();
        let service = ConsultantService::new(&storage);
        let c = service.create(consultant("A", "Civil", (4, 4, 4), &[])).unwrap();

        let after = service.deactivate(c.id).unwrap();
        assert!(!after.is_active);
        assert!(service.list(None, true).unwrap().is_empty());
        assert_eq!(service.list(None, false).unwrap().len(), 1);

        assert!(service.reactivate(c.id).unwrap().is_active);
    }

    #[test]
    fn test_find_by_company() {
        let storage = Storage::in_memory().unwrap();
        let service = ConsultantService::new(&storage);
        let mut c = consultant("Jane", "Civil", (4, 4, 4), &[]);
        c.company = Some("Acme Engineering".into());
        let c = service.create(c).unwrap();
        assert_eq!(service.require("acme engineering").unwrap().id, c.id);
    }

    #[test]
    fn test_linear_fit() {
        let points = vec![
            (1_000.0, Money::from_dollars(20_000)),
            (2_000.0, Money::from_dollars(30_000)),
            (3_000.0, Money::from_dollars(40_000)),
        ];
        let (slope, intercept) = linear_fit(&points).unwrap();
        assert!((slope - 10.0).abs() < 1e-9);
        assert!((intercept - 10_000.0).abs() < 1e-6);

        assert!(linear_fit(&points[..1]).is_none());

        let flat = vec![(500.0, Money::from_dollars(10)), (500.0, Money::from_dollars(30))];
        assert_eq!(linear_fit(&flat), Some((0.0, 20.0)));
    }

    #[test]
    fn test_estimate_price() {
        let storage = Storage::in_memory().unwrap();
        let service = ConsultantService::new(&storage);
        let c = service.create(consultant("A", "Civil", (4, 4, 4), &[])).unwrap();
        add_quote(&storage, c.id, 1_000.0, 20_000, "Warehouse");
        add_quote(&storage, c.id, 3_000.0, 40_000, "Warehouse");
        add_quote(&storage, c.id, 9_000.0, 1, "Office");

        let estimate = service.estimate_price(c.id, 2_000.0, Some("warehouse")).unwrap();
        assert_eq!(estimate.samples, 2);
        let (low, high) = estimate.range.unwrap();
        assert_eq!(low, Money::from_dollars(27_000));
        assert_eq!(high, Money::from_dollars(33_000));

        let single = service.estimate_price(c.id, 2_000.0, Some("Office")).unwrap();
        assert_eq!(single.samples, 1);
        assert!(single.range.is_none());
    }

    #[test]
    fn test_scope_match() {
        let typical = vec!["Stormwater design".to_string(), "Pavement design".to_string()];
        let required = vec!["stormwater design".to_string(), "Bushfire report".to_string()];
        let result = scope_match(&typical, &required);
        assert_eq!(result.match_rate, 0.5);
        assert_eq!(result.matched[0].1, "Stormwater design");
        assert_eq!(result.unmatched, vec!["Bushfire report"]);

        assert_eq!(scope_match(&typical, &[]).match_rate, 0.0);
    }

    #[test]
    fn test_weighted_score() {
        let perfect = consultant("A", "Civil", (5, 5, 5), &[]);
        assert_eq!(weighted_score(&perfect, 1.0, true), 5.0);
        assert_eq!(weighted_score(&perfect, 0.0, false), 3.0);

        let unrated = Consultant::new("B");
        assert_eq!(weighted_score(&unrated, 0.0, false), 0.0);
    }

    #[test]
    fn test_recommend_orders_and_limits() {
        let storage = Storage::in_memory().unwrap();
        let service = ConsultantService::new(&storage);
        for i in 0..6u8 {
            let rating = (i % 5) + 1;
            service
                .create(consultant(&format!("C{}", i), "Civil", (rating, rating, rating), &["Stormwater"]))
                .unwrap();
        }
        let inactive = service
            .create(consultant("Retired", "Civil", (5, 5, 5), &["Stormwater"]))
            .unwrap();
        service.deactivate(inactive.id).unwrap();
        service
            .create(consultant("Other", "Planning", (5, 5, 5), &["Stormwater"]))
            .unwrap();

        let recs = service
            .recommend(Some("Civil"), 1_000.0, &["Stormwater".to_string()], None)
            .unwrap();
        assert_eq!(recs.len(), 5);
        assert!(recs.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(recs.iter().all(|r| r.consultant.name != "Retired"));
        assert!(recs.iter().all(|r| r.consultant.name != "Other"));
        assert_eq!(recs[0].scope_match.match_rate, 1.0);
    }
}
