pub type NodeId = String;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeResponse {
    pub timestamp_ms: Option<u64>,
    pub forwarded_to: Vec<NodeId>,
}

impl NodeResponse {
    pub fn new(timestamp_ms: u64, forwarded_to: impl IntoIterator<Item = impl Into<NodeId>>) -> Self {
        Self {
            timestamp_ms: Some(timestamp_ms),
            forwarded_to: forwarded_to.into_iter().map(Into::into).collect(),
        }
    }

    pub fn forwards_to(&self, target: &str) -> bool {
        self.forwarded_to.iter().any(|id| id == target)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TraceRecord {
    pub origin: Option<NodeId>,
    pub found_at: Option<NodeId>,
    pub responses: Vec<(NodeId, NodeResponse)>,
}

impl TraceRecord {
    pub fn new(origin: impl Into<NodeId>, found_at: Option<&str>) -> Self {
        Self {
            origin: Some(origin.into()),
            found_at: found_at.map(str::to_owned),
            responses: Vec::new(),
        }
    }

    pub fn with_response(mut self, node_id: impl Into<NodeId>, response: NodeResponse) -> Self {
        self.insert_response(node_id.into(), response);
        self
    }

    pub fn insert_response(&mut self, node_id: NodeId, response: NodeResponse) {
        if let Some(slot) = self
            .responses
            .iter_mut()
            .find(|(existing, _)| existing == &node_id)
        {
            slot.1 = response;
        } else {
            self.responses.push((node_id, response));
        }
    }

    pub fn response(&self, node_id: &str) -> Option<&NodeResponse> {
        self.responses
            .iter()
            .find(|(id, _)| id == node_id)
            .map(|(_, response)| response)
    }

    pub fn is_origin(&self, node_id: &str) -> bool {
        self.origin.as_deref() == Some(node_id)
    }

    pub fn is_found_at(&self, node_id: &str) -> bool {
        self.found_at.as_deref() == Some(node_id)
    }

    pub fn record_count(&self) -> usize {
        self.responses.len()
    }
}
