//! Cashflow and loan display formatting

use tabled::Tabled;

use super::{render, yes_no};
use crate::finance::{ConstructionLoan, DrawRow, DualPhaseLoan, InvestmentLoan, ScheduleRow};
use crate::models::Money;
use crate::services::CashflowPoint;

pub fn format_cashflow(points: &[CashflowPoint]) -> String {
    if points.is_empty() {
        return "No months to show.".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:<8}  {:>16}  {:>16}  {:>16}\n",
        "Month", "Income", "Expense", "Net"
    ));
    output.push_str(&format!("{:-<8}  {:-<16}  {:-<16}  {:-<16}\n", "", "", "", ""));

    for point in points {
        output.push_str(&format!(
            "{:<8}  {:>16}  {:>16}  {:>16}\n",
            point.period.to_string(),
            point.income,
            point.expense,
            point.net
        ));
    }

    let income: Money = points.iter().map(|p| p.income).sum();
    let expense: Money = points.iter().map(|p| p.expense).sum();
    let net: Money = points.iter().map(|p| p.net).sum();
    output.push_str(&format!("{:-<8}  {:-<16}  {:-<16}  {:-<16}\n", "", "", "", ""));
    output.push_str(&format!(
        "{:<8}  {:>16}  {:>16}  {:>16}\n",
        "TOTAL", income, expense, net
    ));

    output
}

pub fn format_loan_summary(loan: &InvestmentLoan, annual_noi: Option<Money>) -> String {
    let summary = loan.summary();
    let mut output = String::new();

    output.push_str("Investment Loan\n");
    output.push_str(&format!("  Property Value:      {:>16}\n", loan.property_value));
    output.push_str(&format!("  LVR:                 {:>15.1}%\n", loan.lvr_percent));
    output.push_str(&format!("  Interest Rate:       {:>15.2}%\n", loan.rate_percent));
    output.push_str(&format!(
        "  Term:                {:>10} years ({} interest only)\n",
        loan.term_years, loan.io_years
    ));
    output.push('\n');
    output.push_str(&format!("  Loan Amount:         {:>16}\n", summary.loan_amount));
    output.push_str(&format!("  Establishment Fee:   {:>16}\n", summary.establishment_fee));
    if loan.io_years > 0 {
        output.push_str(&format!("  IO Payment:          {:>16} /month\n", summary.io_payment));
    }
    if loan.amortising_months() > 0 {
        output.push_str(&format!("  P&I Payment:         {:>16} /month\n", summary.pi_payment));
    }
    output.push_str(&format!("  Year 1 Debt Service: {:>16}\n", summary.year1_debt_service));
    output.push_str(&format!("  Total Payments:      {:>16}\n", summary.total_payments));
    output.push_str(&format!("  Total Interest:      {:>16}\n", summary.total_interest));
    output.push_str(&format!("  Cost of Borrowing:   {:>16}\n", summary.cost_of_borrowing));

    if let Some(noi) = annual_noi {
        output.push_str(&format!("  DSCR:                {:>16.2}\n", loan.dscr(noi)));
    }

    output
}

#[derive(Tabled)]
struct LoanRow {
    #[tabled(rename = "Month")]
    period: u32,
    #[tabled(rename = "Payment")]
    payment: String,
    #[tabled(rename = "Principal")]
    principal: String,
    #[tabled(rename = "Interest")]
    interest: String,
    #[tabled(rename = "Balance")]
    balance: String,
    #[tabled(rename = "Phase")]
    phase: String,
}

/// Schedule rows, optionally thinned to every `step`-th month plus the last
pub fn format_loan_schedule(rows: &[ScheduleRow], step: usize) -> String {
    let step = step.max(1);
    let last = rows.len().saturating_sub(1);
    let table_rows = rows
        .iter()
        .enumerate()
        .filter(|(i, _)| i % step == 0 || *i == last)
        .map(|(_, r)| LoanRow {
            period: r.period,
            payment: Money::from_f64(r.payment).to_string(),
            principal: Money::from_f64(r.principal).to_string(),
            interest: Money::from_f64(r.interest).to_string(),
            balance: Money::from_f64(r.balance).to_string(),
            phase: r.phase.to_string(),
        })
        .collect();
    render(table_rows, "Empty schedule.")
}

pub fn format_construction_summary(loan: &ConstructionLoan) -> String {
    let summary = loan.summary();
    let mut output = String::new();

    output.push_str("Construction Loan\n");
    output.push_str(&format!("  Development Cost:    {:>16}\n", loan.development_cost));
    output.push_str(&format!("  Loan to Cost:        {:>15.1}%\n", loan.ltc_percent));
    output.push_str(&format!("  Interest Rate:       {:>15.2}%\n", loan.rate_percent));
    output.push_str(&format!(
        "  Duration:            {:>10} months ({} draw)\n",
        loan.duration_months, loan.profile
    ));
    output.push('\n');
    output.push_str(&format!("  Loan Amount:         {:>16}\n", summary.loan_amount));
    output.push_str(&format!("  Establishment Fee:   {:>16}\n", summary.establishment_fee));
    output.push_str(&format!("  Line Fee:            {:>16}\n", summary.line_fee));
    output.push_str(&format!(
        "  Total Interest:      {:>16} ({})\n",
        summary.total_interest,
        if loan.capitalise_interest { "capitalised" } else { "paid from equity" }
    ));
    output.push_str(&format!("  Loan at Completion:  {:>16}\n", summary.loan_at_completion));
    output.push_str(&format!("  Equity Required:     {:>16}\n", summary.equity_required));
    output.push_str(&format!(
        "  Effective Rate:      {:>15.2}%\n",
        summary.effective_rate_percent
    ));

    output
}

#[derive(Tabled)]
struct DrawTableRow {
    #[tabled(rename = "Month")]
    month: u32,
    #[tabled(rename = "Draw")]
    draw: String,
    #[tabled(rename = "%")]
    percent: String,
    #[tabled(rename = "Drawn")]
    drawn: String,
    #[tabled(rename = "Interest")]
    interest: String,
    #[tabled(rename = "Outstanding")]
    outstanding: String,
}

pub fn format_draw_schedule(rows: &[DrawRow]) -> String {
    let table_rows = rows
        .iter()
        .map(|r| DrawTableRow {
            month: r.month,
            draw: Money::from_f64(r.draw).to_string(),
            percent: format!("{:.1}", r.draw_percent),
            drawn: Money::from_f64(r.cumulative_drawn).to_string(),
            interest: Money::from_f64(r.interest).to_string(),
            outstanding: Money::from_f64(r.outstanding).to_string(),
        })
        .collect();
    render(table_rows, "Empty draw schedule.")
}

#[derive(Tabled)]
struct ComparisonTableRow {
    #[tabled(rename = "Phase")]
    category: &'static str,
    #[tabled(rename = "Item")]
    parameter: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

/// Side-by-side figures followed by the refinance and equity position
pub fn format_refinance(loan: &DualPhaseLoan) -> String {
    let analysis = loan.analyse();
    let rows = loan
        .comparison()
        .into_iter()
        .map(|r| ComparisonTableRow {
            category: r.category,
            parameter: r.parameter,
            value: r.value,
        })
        .collect();

    let mut output = render(rows, "");
    output.push('\n');
    output.push_str(&format!(
        "  Development Margin:  {:>16} ({:.1}%)\n",
        analysis.development_margin, analysis.development_margin_percent
    ));
    output.push_str(&format!("  Construction Payoff: {:>16}\n", analysis.construction_payoff));
    output.push_str(&format!("  Investment Loan:     {:>16}\n", analysis.investment_loan));
    if analysis.refinance_feasible {
        output.push_str(&format!("  Equity Release:      {:>16}\n", analysis.equity_release));
    } else {
        output.push_str(&format!(
            "  Shortfall:           {:>16}\n",
            analysis.additional_equity_required
        ));
    }
    output.push_str(&format!("  Net Equity Invested: {:>16}\n", analysis.net_equity_invested));
    output.push_str(&format!("  Upfront Costs:       {:>16}\n", analysis.upfront_costs));
    if analysis.dscr.is_some() {
        output.push_str(&format!(
            "  DSCR Adequate:       {:>16}\n",
            yes_no(analysis.dscr_adequate())
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::YearMonth;

    #[test]
    fn test_cashflow_total_row() {
        let points = vec![
            CashflowPoint::new(
                YearMonth::new(2025, 1).unwrap(),
                Money::from_dollars(1000),
                Money::from_dollars(400),
            ),
            CashflowPoint::new(
                YearMonth::new(2025, 2).unwrap(),
                Money::from_dollars(500),
                Money::from_dollars(700),
            ),
        ];
        let out = format_cashflow(&points);
        assert!(out.contains("TOTAL"));
        assert!(out.contains("$400.00"));
    }

    #[test]
    fn test_loan_summary_has_dscr_only_with_noi() {
        let loan = InvestmentLoan::new(Money::from_dollars(1_000_000));
        assert!(!format_loan_summary(&loan, None).contains("DSCR"));
        assert!(format_loan_summary(&loan, Some(Money::from_dollars(80_000))).contains("DSCR"));
    }

    #[test]
    fn test_construction_summary_and_draws() {
        let loan = ConstructionLoan::new(Money::from_dollars(2_000_000));
        let out = format_construction_summary(&loan);
        assert!(out.contains("$1,300,000.00"));
        assert!(out.contains("S-curve"));
        assert!(out.contains("capitalised"));

        let table = format_draw_schedule(&loan.draw_schedule());
        assert!(table.contains("Outstanding"));
        assert!(table.contains(" 12 "));
    }

    #[test]
    fn test_refinance_shows_shortfall_when_infeasible() {
        let ok = DualPhaseLoan::new(Money::from_dollars(8_500_000), Money::from_dollars(10_200_000));
        let out = format_refinance(&ok);
        assert!(out.contains("Equity Release"));
        assert!(!out.contains("Shortfall:"));
        assert!(out.contains("Loan at Completion"));
        assert!(!out.contains("DSCR"));

        let short = DualPhaseLoan::new(Money::from_dollars(8_500_000), Money::from_dollars(8_500_000));
        assert!(format_refinance(&short).contains("Shortfall:"));
    }

    #[test]
    fn test_schedule_thinning_keeps_last_row() {
        let loan = InvestmentLoan::new(Money::from_dollars(500_000));
        let rows = loan.schedule();
        let out = format_loan_schedule(&rows, 12);
        assert!(out.contains(&format!(" {} ", rows.len())));
        assert!(out.contains("Interest Only"));
    }
}
