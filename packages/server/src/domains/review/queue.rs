use sqlx::PgPool;
use tracing::debug;

use crate::common::string_enum::string_enum;
use crate::common::{Page, PageArgs, PipelineError, PipelineResult};
use crate::domains::extraction::{ConfidenceOrder, Extraction, ExtractionQuery, ExtractionStatus};
use crate::domains::source::SourceType;

string_enum! {
    /// Direction of the queue's confidence ordering.
    pub enum QueueOrder {
        Ascending => "asc" | "ascending" | "lowest_first",
        Descending => "desc" | "descending" | "highest_first",
    }
}

impl Default for QueueOrder {
    fn default() -> Self {
        QueueOrder::Descending
    }
}

impl From<QueueOrder> for ConfidenceOrder {
    fn from(order: QueueOrder) -> Self {
        match order {
            QueueOrder::Ascending => ConfidenceOrder::Ascending,
            QueueOrder::Descending => ConfidenceOrder::Descending,
        }
    }
}

/// Queue filters. Without `status`, every pending status is listed.
#[derive(Debug, Clone, Default)]
pub struct PendingFilter {
    pub status: Option<ExtractionStatus>,
    pub source_type: Option<SourceType>,
    pub confidence_min: Option<f64>,
    pub confidence_max: Option<f64>,
}

impl PendingFilter {
    fn validate(&self) -> PipelineResult<()> {
        for (label, value) in [
            ("confidenceMin", self.confidence_min),
            ("confidenceMax", self.confidence_max),
        ] {
            if let Some(v) = value {
                if !(0.0..=1.0).contains(&v) {
                    return Err(PipelineError::Validation(format!(
                        "{} must be between 0 and 1, got {}",
                        label, v
                    )));
                }
            }
        }
        if let (Some(min), Some(max)) = (self.confidence_min, self.confidence_max) {
            if min > max {
                return Err(PipelineError::Validation(format!(
                    "confidenceMin ({}) is greater than confidenceMax ({})",
                    min, max
                )));
            }
        }
        Ok(())
    }

    fn to_query(&self) -> ExtractionQuery {
        ExtractionQuery {
            statuses: match self.status {
                Some(status) => vec![status],
                None => ExtractionStatus::PENDING.to_vec(),
            },
            source_type: self.source_type.map(|t| t.as_str().to_string()),
            confidence_min: self.confidence_min,
            confidence_max: self.confidence_max,
        }
    }
}

/// One page of the review queue, ordered by confidence in the configured
/// direction (ties oldest first).
pub async fn list_pending(
    filter: &PendingFilter,
    order: QueueOrder,
    page: PageArgs,
    pool: &PgPool,
) -> PipelineResult<Page<Extraction>> {
    filter.validate()?;

    let rows = Extraction::find_paginated(&filter.to_query(), order.into(), &page, pool).await?;
    debug!(
        rows = rows.len(),
        order = %order,
        offset = page.offset,
        "Listed review queue"
    );
    Ok(page.into_page(rows))
}
