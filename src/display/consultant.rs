//! Consultant and quote display formatting

use tabled::Tabled;

use super::{fmt_date, or_dash, render, yes_no};
use crate::models::{Consultant, Quote};
use crate::services::{PriceEstimate, Recommendation};
use crate::storage::QuoteHistoryRow;

fn stars(rating: Option<u8>) -> String {
    match rating {
        Some(r) => format!("{}/5", r),
        None => "-".to_string(),
    }
}

#[derive(Tabled)]
struct ConsultantRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Company")]
    company: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Quality")]
    quality: String,
    #[tabled(rename = "Reliability")]
    reliability: String,
    #[tabled(rename = "Cost")]
    cost: String,
    #[tabled(rename = "Active")]
    active: &'static str,
}

pub fn format_consultant_list(consultants: &[Consultant]) -> String {
    let rows = consultants
        .iter()
        .map(|c| ConsultantRow {
            id: c.id.to_string(),
            name: c.name.clone(),
            company: or_dash(c.company.as_deref()),
            category: or_dash(c.category.as_deref()),
            quality: stars(c.quality_rating),
            reliability: stars(c.reliability_rating),
            cost: stars(c.cost_rating),
            active: yes_no(c.is_active),
        })
        .collect();
    render(rows, "No consultants found.")
}

pub fn format_consultant_details(consultant: &Consultant, quotes: &[Quote]) -> String {
    let mut output = String::new();

    output.push_str(&format!("Consultant: {}\n", consultant.name));
    output.push_str(&format!("  ID:          {}\n", consultant.id));
    output.push_str(&format!("  Company:     {}\n", or_dash(consultant.company.as_deref())));
    output.push_str(&format!("  Email:       {}\n", or_dash(consultant.email.as_deref())));
    output.push_str(&format!("  Phone:       {}\n", or_dash(consultant.phone.as_deref())));
    output.push_str(&format!("  Category:    {}\n", or_dash(consultant.category.as_deref())));
    output.push_str(&format!("  Active:      {}\n", yes_no(consultant.is_active)));
    output.push_str(&format!(
        "  Ratings:     quality {}, reliability {}, cost {}\n",
        stars(consultant.quality_rating),
        stars(consultant.reliability_rating),
        stars(consultant.cost_rating)
    ));
    if !consultant.typical_scopes.is_empty() {
        output.push_str(&format!("  Scopes:      {}\n", consultant.typical_scopes.join(", ")));
    }
    if !consultant.notes.is_empty() {
        output.push_str(&format!("  Notes:       {}\n", consultant.notes));
    }

    output.push('\n');
    if quotes.is_empty() {
        output.push_str("  No quotes on record.\n");
    } else {
        output.push_str(&format!("  Quotes ({}):\n", quotes.len()));
        for quote in quotes {
            output.push_str(&format!(
                "    {}  {}  {:>14}  {:<10} {}\n",
                quote.id,
                fmt_date(quote.quote_date),
                quote.amount,
                quote.status.to_string(),
                quote.scope.as_deref().unwrap_or("")
            ));
        }
    }

    output
}

#[derive(Tabled)]
struct QuoteHistoryTableRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Consultant")]
    consultant: String,
    #[tabled(rename = "Project")]
    project: String,
    #[tabled(rename = "Scope")]
    scope: String,
    #[tabled(rename = "Quoted")]
    amount: String,
    #[tabled(rename = "Actual")]
    actual: String,
    #[tabled(rename = "Status")]
    status: String,
}

pub fn format_quote_history(rows: &[QuoteHistoryRow]) -> String {
    let table_rows = rows
        .iter()
        .map(|r| QuoteHistoryTableRow {
            id: r.quote_id.to_string(),
            date: fmt_date(r.quote_date),
            consultant: match &r.company {
                Some(company) => format!("{} ({})", r.consultant_name, company),
                None => r.consultant_name.clone(),
            },
            project: or_dash(r.project_name.as_deref()),
            scope: or_dash(r.scope.as_deref()),
            amount: r.amount.to_string(),
            actual: or_dash(r.actual_amount),
            status: r.status.to_string(),
        })
        .collect();
    render(table_rows, "No quotes found.")
}

pub fn format_price_estimate(estimate: &PriceEstimate) -> String {
    match estimate.range {
        Some((low, high)) => format!("{} - {} ({} quotes)", low, high, estimate.samples),
        None => format!("not enough history ({} quotes)", estimate.samples),
    }
}

#[derive(Tabled)]
struct RecommendationRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Consultant")]
    name: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Scope Match")]
    scope: String,
    #[tabled(rename = "Estimated Price")]
    price: String,
}

pub fn format_recommendations(recommendations: &[Recommendation]) -> String {
    let rows: Vec<RecommendationRow> = recommendations
        .iter()
        .enumerate()
        .map(|(i, r)| RecommendationRow {
            rank: i + 1,
            name: r.consultant.name.clone(),
            score: format!("{:.2}", r.score),
            scope: format!("{:.0}%", r.scope_match.match_rate * 100.0),
            price: format_price_estimate(&r.price),
        })
        .collect();

    let mut output = render(rows, "No matching consultants found.");

    for r in recommendations {
        if !r.scope_match.unmatched.is_empty() {
            output.push_str(&format!(
                "{}: no match for {}\n",
                r.consultant.name,
                r.scope_match.unmatched.join(", ")
            ));
        }
    }

    output
}
