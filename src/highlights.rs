use crate::aggregator::UnitReport;
use crate::breakdown::{merge_breakdowns, top, BreakdownPoint};
use serde::{Deserialize, Serialize};

/// Short leaderboards shown next to the KPI cards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlights {
    pub top_categories: Vec<BreakdownPoint>,
    pub top_agents: Vec<BreakdownPoint>,
}

impl Highlights {
    pub fn for_unit(breakdown: &[BreakdownPoint], agents: &[BreakdownPoint], limit: usize) -> Self {
        Self {
            top_categories: top(breakdown, limit),
            top_agents: top(agents, limit),
        }
    }

    /// Leaders across every unit, with identical labels merged.
    pub fn consolidated(reports: &[UnitReport], limit: usize) -> Self {
        let categories =
            merge_breakdowns(reports.iter().map(|r| r.aggregate.breakdown.as_slice()));
        let agents = merge_breakdowns(reports.iter().map(|r| r.agents.as_slice()));

        Self {
            top_categories: top(&categories, limit),
            top_agents: top(&agents, limit),
        }
    }
}
