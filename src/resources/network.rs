use super::require_id;
use crate::{
    Dispatch, FirewallRule, FirewallState, GuestKind, NetworkInterface, Operation,
    PartialFailure, ProxmoxGateway, ProxmoxResult,
    core::application::normalizer::{
        self,
        raw::{RawFirewallOptions, RawFirewallRule, RawInterface},
    },
};

impl<D: Dispatch> ProxmoxGateway<D> {
    /// Network interfaces configured on one node.
    pub async fn network_interfaces(&self, node: &str) -> ProxmoxResult<Vec<NetworkInterface>> {
        require_id("node", node)?;
        let raw: Vec<RawInterface> = self
            .fetch_records(&Operation::NodeNetwork {
                node: node.to_string(),
            })
            .await?;
        Ok(raw
            .into_iter()
            .filter_map(normalizer::normalize_interface)
            .collect())
    }

    /// Cluster firewall options and rules.
    ///
    /// The rules are required; unreadable options only leave `enabled` unset.
    pub async fn cluster_firewall(&self) -> ProxmoxResult<FirewallState> {
        let (options, rules) = futures::join!(
            self.fetch_record::<RawFirewallOptions>(&Operation::ClusterFirewallOptions),
            self.fetch_records::<RawFirewallRule>(&Operation::ClusterFirewallRules)
        );
        let rules = firewall_rules(rules?);

        Ok(match options {
            Ok(options) => FirewallState {
                enabled: Some(options.enable.unwrap_or(false)),
                policy_in: options.policy_in,
                policy_out: options.policy_out,
                rules,
                failures: Vec::new(),
            },
            Err(e) => FirewallState {
                enabled: None,
                policy_in: None,
                policy_out: None,
                rules,
                failures: vec![PartialFailure::new("firewall-options", &e)],
            },
        })
    }

    /// Firewall rules of one guest.
    pub async fn guest_firewall_rules(
        &self,
        node: &str,
        kind: GuestKind,
        vmid: u32,
    ) -> ProxmoxResult<Vec<FirewallRule>> {
        require_id("node", node)?;
        let raw = self
            .fetch_records(&Operation::GuestFirewallRules {
                node: node.to_string(),
                kind,
                vmid,
            })
            .await?;
        Ok(firewall_rules(raw))
    }
}

fn firewall_rules(raw: Vec<RawFirewallRule>) -> Vec<FirewallRule> {
    raw.into_iter()
        .enumerate()
        .map(|(index, rule)| normalizer::normalize_firewall_rule(rule, index))
        .collect()
}
