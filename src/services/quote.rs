//! Quote service

use tracing::info;

use crate::audit::EntityType;
use crate::error::{EstateError, EstateResult};
use crate::models::{ConsultantId, Money, ProjectId, Quote, QuoteId, QuoteStatus};
use crate::storage::{QuoteHistoryRow, Storage};

pub struct QuoteService<'a> {
    storage: &'a Storage,
}

impl<'a> QuoteService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub fn add(&self, mut quote: Quote) -> EstateResult<Quote> {
        quote
            .validate()
            .map_err(|e| EstateError::Validation(e.to_string()))?;

        let consultant = self
            .storage
            .consultants()
            .get(quote.consultant_id)?
            .ok_or_else(|| EstateError::consultant_not_found(quote.consultant_id.to_string()))?;

        quote.id = self.storage.quotes().insert(&quote)?;
        info!(id = %quote.id, consultant = %consultant.name, amount = %quote.amount, "Recorded quote");

        self.storage.log_create(
            EntityType::Quote,
            quote.id.to_string(),
            Some(consultant.name),
            &quote,
        )?;

        Ok(quote)
    }

    pub fn get(&self, id: QuoteId) -> EstateResult<Option<Quote>> {
        self.storage.quotes().get(id)
    }

    pub fn require(&self, identifier: &str) -> EstateResult<Quote> {
        let id = identifier
            .parse::<QuoteId>()
            .map_err(|_| EstateError::quote_not_found(identifier))?;
        self.get(id)?
            .ok_or_else(|| EstateError::quote_not_found(identifier))
    }

    pub fn list_for_consultant(&self, consultant_id: ConsultantId) -> EstateResult<Vec<Quote>> {
        self.storage.quotes().list_for_consultant(consultant_id)
    }

    /// Quotes with consultant and project names, newest first
    pub fn history(
        &self,
        project_id: Option<ProjectId>,
        consultant_id: Option<ConsultantId>,
    ) -> EstateResult<Vec<QuoteHistoryRow>> {
        self.storage.quotes().history(project_id, consultant_id)
    }

    /// Move a quote to a new status, optionally recording the final amount
    pub fn update_status(
        &self,
        id: QuoteId,
        status: QuoteStatus,
        actual_amount: Option<Money>,
    ) -> EstateResult<Quote> {
        if actual_amount.is_some_and(|a| a.is_negative()) {
            return Err(EstateError::Validation(
                "Actual amount cannot be negative".into(),
            ));
        }

        let before = self
            .get(id)?
            .ok_or_else(|| EstateError::quote_not_found(id.to_string()))?;
        self.storage.quotes().set_status(id, status, actual_amount)?;
        let after = self
            .get(id)?
            .ok_or_else(|| EstateError::quote_not_found(id.to_string()))?;
        info!(id = %id, from = %before.status, to = %after.status, "Updated quote status");

        self.storage.log_update(
            EntityType::Quote,
            id.to_string(),
            after.scope.clone(),
            &before,
            &after,
        )?;

        Ok(after)
    }

    pub fn delete(&self, id: QuoteId) -> EstateResult<Quote> {
        let quote = self
            .get(id)?
            .ok_or_else(|| EstateError::quote_not_found(id.to_string()))?;
        self.storage.quotes().delete(id)?;
        info!(id = %id, "Deleted quote");

        self.storage.log_delete(
            EntityType::Quote,
            id.to_string(),
            quote.scope.clone(),
            &quote,
        )?;

        Ok(quote)
    }
}
