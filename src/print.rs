//! Console tables.

use stanza::style::{HAlign, Header, MinWidth, Separator, Styles};
use stanza::table::{Cell, Col, Row, Table};

use crate::domain::Side;
use crate::predictor::FixturePrediction;
use crate::scoregrid::OutcomeProbs;
use crate::strength::{DerivationReport, Derived, PowerRanking};
use crate::summary::{Tally, TeamSummary};

fn header_row(cells: Vec<Cell>) -> Row {
    Row::new(Styles::default().with(Header(true)), cells)
}

fn numeric_col(min_width: usize) -> Col {
    Col::new(Styles::default().with(MinWidth(min_width)).with(HAlign::Right))
}

fn prob_cells(probs: &OutcomeProbs) -> [Cell; 3] {
    probs.to_array().map(|prob| format!("{prob:.3}").into())
}

pub fn tabulate_ranking(ranking: &PowerRanking) -> Table {
    let mut table = Table::default()
        .with_cols(vec![
            numeric_col(5),
            Col::new(Styles::default().with(MinWidth(20))),
            numeric_col(10),
        ])
        .with_row(header_row(vec!["Rank".into(), "Team".into(), "Strength".into()]));
    for entry in ranking.entries() {
        table.push_row(Row::new(
            Styles::default(),
            vec![
                entry.rank.to_string().into(),
                entry.team.clone().into(),
                format!("{:.3}", entry.strength).into(),
            ],
        ));
    }
    table
}

pub fn tabulate_report(report: &DerivationReport) -> Table {
    let mut table = Table::default()
        .with_cols(vec![
            Col::new(Styles::default().with(MinWidth(10))),
            Col::new(Styles::default().with(MinWidth(40))),
        ])
        .with_row(header_row(vec!["Stage".into(), "Status".into()]));
    let stages = [
        ("strength", stage_status(&report.strength)),
        ("scorers", stage_status(&report.scorers)),
        ("ability", stage_status(&report.ability)),
        ("ranking", stage_status(&report.ranking)),
    ];
    for (stage, status) in stages {
        table.push_row(Row::new(Styles::default(), vec![stage.into(), status.into()]));
    }
    table
}

fn stage_status<T>(derived: &Derived<T>) -> String {
    match derived {
        Derived::Computed(_) => "computed".to_string(),
        Derived::Defaulted(reason) => format!("defaulted: {reason}"),
        Derived::Skipped(reason) => format!("skipped: {reason}"),
    }
}

/// One row per fixture, with the classifier's probabilities alongside the expected-goals model's.
pub fn tabulate_predictions(predictions: &[FixturePrediction]) -> Table {
    let mut cols = vec![
        Col::new(Styles::default().with(MinWidth(20))),
        Col::new(Styles::default().with(MinWidth(20))),
    ];
    for section in 0..2 {
        for _ in 0..3 {
            cols.push(Col::new(
                Styles::default()
                    .with(Separator(section == 0))
                    .with(MinWidth(7))
                    .with(HAlign::Right),
            ));
        }
    }
    cols.push(numeric_col(7));
    cols.push(numeric_col(7));

    let mut table = Table::default().with_cols(cols).with_row(header_row(vec![
        "Home".into(),
        "Away".into(),
        "Base H".into(),
        "Base D".into(),
        "Base A".into(),
        "xG H".into(),
        "xG D".into(),
        "xG A".into(),
        "λ home".into(),
        "λ away".into(),
    ]));
    for prediction in predictions {
        let mut cells: Vec<Cell> = vec![prediction.home_team.clone().into(), prediction.away_team.clone().into()];
        cells.extend(prob_cells(&prediction.classifier));
        match &prediction.xg {
            Some(xg) => {
                cells.extend(prob_cells(&xg.probs));
                cells.push(format!("{:.3}", xg.lambda_home).into());
                cells.push(format!("{:.3}", xg.lambda_away).into());
            }
            None => cells.extend((0..5).map(|_| Cell::from("-"))),
        }
        table.push_row(Row::new(Styles::default(), cells));
    }
    table
}

pub fn tabulate_summary(summary: &TeamSummary) -> Table {
    let mut table = Table::default()
        .with_cols({
            let mut cols = vec![Col::new(Styles::default().with(MinWidth(8)))];
            cols.extend((0..9).map(|_| numeric_col(6)));
            cols
        })
        .with_row(header_row(vec![
            summary.team.clone().into(),
            "P".into(),
            "GF".into(),
            "GA".into(),
            "W".into(),
            "D".into(),
            "L".into(),
            "W%".into(),
            "D%".into(),
            "L%".into(),
        ]));
    let total = summary.total();
    for (venue, tally) in [
        ("Home", summary.venue(Side::Home)),
        ("Away", summary.venue(Side::Away)),
        ("Total", &total),
    ] {
        table.push_row(Row::new(Styles::default(), tally_cells(venue, tally)));
    }
    table
}

fn tally_cells(venue: &str, tally: &Tally) -> Vec<Cell> {
    vec![
        venue.into(),
        tally.played.to_string().into(),
        tally.goals_for.to_string().into(),
        tally.goals_against.to_string().into(),
        tally.wins.to_string().into(),
        tally.draws.to_string().into(),
        tally.losses.to_string().into(),
        format!("{:.1}", tally.win_rate()).into(),
        format!("{:.1}", tally.draw_rate()).into(),
        format!("{:.1}", tally.loss_rate()).into(),
    ]
}
