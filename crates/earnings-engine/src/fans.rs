//! Fan and subscription metrics scoped to one creator and one period

use serde::Serialize;
use std::collections::HashSet;

use crate::engine::AggregationEngine;
use crate::ledger::{Fan, SubscriptionStatus, SubscriptionType};
use crate::period::Period;

/// Count of matching fans and the net earnings of their transactions
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SubscriptionSummary {
    pub count: usize,
    pub earnings: f64,
}

impl AggregationEngine {
    fn creator_fans<'a>(&'a self, creator: &'a str) -> impl Iterator<Item = &'a Fan> + 'a {
        self.ledger().fans.iter().filter(move |fan| fan.creator_alias == creator)
    }

    /// Active fans whose subscription started on or before the end of `period`
    pub(crate) fn current_fans<'a>(&'a self, creator: &'a str, period: Period) -> impl Iterator<Item = &'a Fan> + 'a {
        self.creator_fans(creator).filter(move |fan| {
            fan.subscription_status == SubscriptionStatus::Active && fan.subscription_start <= period.end
        })
    }

    /// Net of every non-refunded transaction these fans made with `creator`
    fn fan_net_earnings(&self, creator: &str, fan_ids: &HashSet<&str>) -> f64 {
        self.ledger()
            .transactions
            .iter()
            .filter(|tx| !tx.is_refunded() && tx.creator_alias == creator)
            .filter(|tx| tx.fan_id.as_deref().is_some_and(|id| fan_ids.contains(id)))
            .map(|tx| tx.amounts.net)
            .sum()
    }

    fn summarize<'a>(&'a self, creator: &str, fans: impl Iterator<Item = &'a Fan>) -> SubscriptionSummary {
        let fan_ids: HashSet<&str> = fans.map(|fan| fan.fan_id.as_str()).collect();
        SubscriptionSummary {
            count: fan_ids.len(),
            earnings: self.fan_net_earnings(creator, &fan_ids),
        }
    }

    pub(crate) fn new_subscription_summary(&self, creator: &str, period: Period) -> SubscriptionSummary {
        let fans = self.creator_fans(creator).filter(|fan| {
            fan.subscription_type == SubscriptionType::New && period.contains(fan.subscription_start)
        });
        self.summarize(creator, fans)
    }

    pub(crate) fn recurring_subscription_summary(&self, creator: &str, period: Period) -> SubscriptionSummary {
        let fans = self.creator_fans(creator).filter(|fan| {
            fan.subscription_type == SubscriptionType::Recurring && fan.subscription_start < period.start
        });
        self.summarize(creator, fans)
    }

    /// Distinct known fans with at least one earning transaction in `period`
    pub(crate) fn active_fan_count(&self, creator: &str, period: Period) -> usize {
        let known: HashSet<&str> = self.creator_fans(creator).map(|fan| fan.fan_id.as_str()).collect();
        self.earning_transactions(period, None, Some(creator))
            .filter_map(|tx| tx.fan_id.as_deref())
            .filter(|id| known.contains(id))
            .collect::<HashSet<_>>()
            .len()
    }

    pub(crate) fn spend_per_spender(&self, creator: &str, period: Period) -> f64 {
        let spenders = self.active_fan_count(creator, period);
        if spenders == 0 {
            return 0.0;
        }
        self.earnings(period, None, Some(creator)).net / spenders as f64
    }

    pub(crate) fn spend_per_transaction(&self, creator: &str, period: Period) -> f64 {
        let totals = self.earnings(period, None, Some(creator));
        if totals.transaction_count == 0 {
            return 0.0;
        }
        totals.net / totals.transaction_count as f64
    }

    /// Mean whole days from subscription start to last transaction over current fans
    pub(crate) fn subscription_length_days(&self, creator: &str, period: Period) -> f64 {
        let (fans, total_days) = self
            .current_fans(creator, period)
            .fold((0usize, 0i64), |(fans, days), fan| {
                let length = fan
                    .last_transaction
                    .map_or(0, |last| (last - fan.subscription_start).num_days());
                (fans + 1, days + length)
            });

        if fans == 0 {
            return 0.0;
        }
        total_days as f64 / fans as f64
    }
}
