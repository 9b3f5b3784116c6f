use serde::{Deserialize, Serialize};

/// One hop in a funding source or destination tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingNode {
    pub address: String,
    /// Aggregate ETH value flowing through this node.
    #[serde(default)]
    pub total_value: f64,
    #[serde(default)]
    pub children: Vec<FundingNode>,
}

impl FundingNode {
    pub fn leaf(address: impl Into<String>, total_value: f64) -> Self {
        Self {
            address: address.into(),
            total_value,
            children: Vec::new(),
        }
    }

    /// All nodes below this one (the node itself excluded), in pre-order.
    ///
    /// Walks with an explicit stack so arbitrarily deep trees cannot overflow
    /// the call stack. An owned tree cannot contain cycles, so every node is
    /// visited exactly once and repeated addresses on different branches are
    /// all reported.
    pub fn descendants(&self) -> Vec<&FundingNode> {
        let mut result = Vec::new();
        let mut stack: Vec<&FundingNode> = self.children.iter().rev().collect();

        while let Some(node) = stack.pop() {
            result.push(node);
            stack.extend(node.children.iter().rev());
        }

        result
    }

    /// Addresses of all descendants, in pre-order, duplicates preserved.
    pub fn descendant_addresses(&self) -> Vec<&str> {
        self.descendants()
            .into_iter()
            .map(|n| n.address.as_str())
            .collect()
    }
}
