/// The nine blocks of a Lean Canvas, with the coaching copy shown next to each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeanCanvasBlock {
    Problem,
    CustomerSegments,
    UniqueValueProposition,
    Solution,
    Channels,
    RevenueStreams,
    CostStructure,
    KeyMetrics,
    UnfairAdvantage,
}

impl LeanCanvasBlock {
    pub const ALL: [LeanCanvasBlock; 9] = [
        LeanCanvasBlock::Problem,
        LeanCanvasBlock::CustomerSegments,
        LeanCanvasBlock::UniqueValueProposition,
        LeanCanvasBlock::Solution,
        LeanCanvasBlock::Channels,
        LeanCanvasBlock::RevenueStreams,
        LeanCanvasBlock::CostStructure,
        LeanCanvasBlock::KeyMetrics,
        LeanCanvasBlock::UnfairAdvantage,
    ];

    /// Stable camelCase key used when canvas content is stored.
    pub fn key(self) -> &'static str {
        match self {
            LeanCanvasBlock::Problem => "problem",
            LeanCanvasBlock::CustomerSegments => "customerSegments",
            LeanCanvasBlock::UniqueValueProposition => "uniqueValueProposition",
            LeanCanvasBlock::Solution => "solution",
            LeanCanvasBlock::Channels => "channels",
            LeanCanvasBlock::RevenueStreams => "revenueStreams",
            LeanCanvasBlock::CostStructure => "costStructure",
            LeanCanvasBlock::KeyMetrics => "keyMetrics",
            LeanCanvasBlock::UnfairAdvantage => "unfairAdvantage",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LeanCanvasBlock::Problem => "Problem",
            LeanCanvasBlock::CustomerSegments => "Customer Segments",
            LeanCanvasBlock::UniqueValueProposition => "Unique Value Proposition",
            LeanCanvasBlock::Solution => "Solution",
            LeanCanvasBlock::Channels => "Channels",
            LeanCanvasBlock::RevenueStreams => "Revenue Streams",
            LeanCanvasBlock::CostStructure => "Cost Structure",
            LeanCanvasBlock::KeyMetrics => "Key Metrics",
            LeanCanvasBlock::UnfairAdvantage => "Unfair Advantage",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            LeanCanvasBlock::Problem => "What problem are you solving? List the top 1-3 problems.",
            LeanCanvasBlock::CustomerSegments => "Who are your target customers? Be specific.",
            LeanCanvasBlock::UniqueValueProposition => {
                "What makes you different? Your single, clear message."
            }
            LeanCanvasBlock::Solution => "How do you solve the problem? List your top features.",
            LeanCanvasBlock::Channels => "How do you reach your customers?",
            LeanCanvasBlock::RevenueStreams => "How do you make money?",
            LeanCanvasBlock::CostStructure => "What are your major costs?",
            LeanCanvasBlock::KeyMetrics => "How do you measure success?",
            LeanCanvasBlock::UnfairAdvantage => "What can't be easily copied or bought?",
        }
    }

    pub fn coaching_hint(self) -> &'static str {
        match self {
            LeanCanvasBlock::Problem => {
                "Help me identify and articulate the key problems my startup solves."
            }
            LeanCanvasBlock::CustomerSegments => "Help me define and segment my target customers.",
            LeanCanvasBlock::UniqueValueProposition => {
                "Help me craft a compelling unique value proposition."
            }
            LeanCanvasBlock::Solution => "Help me define the solution features.",
            LeanCanvasBlock::Channels => "Suggest effective channels to reach customers.",
            LeanCanvasBlock::RevenueStreams => "Help me identify potential revenue streams.",
            LeanCanvasBlock::CostStructure => "Help me identify key cost drivers.",
            LeanCanvasBlock::KeyMetrics => "Suggest key metrics and KPIs to track.",
            LeanCanvasBlock::UnfairAdvantage => "Help me identify my unfair advantage.",
        }
    }

    /// Look a block up by key or display name. Case, spaces, underscores and
    /// hyphens are ignored, so "customer_segments", "Customer Segments" and
    /// "customerSegments" all resolve.
    pub fn resolve(label: &str) -> Option<Self> {
        let wanted = normalize(label);
        if wanted.is_empty() {
            return None;
        }
        Self::ALL.into_iter().find(|block| normalize(block.name()) == wanted)
    }
}

fn normalize(label: &str) -> String {
    label
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}
