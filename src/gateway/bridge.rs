//! Gateway bridge client
//!
//! HTTP client for a bridge process that holds the native trading-gateway
//! connection. Requests carry the venue's own field names and
//! single-character codes, so the bridge only has to copy fields across.

use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use super::types::direction_code;
use super::{GatewayError, GatewayReply, GatewayResult, InputOrder, SettlementConfirm, TradingGateway};

const SETTLEMENT_CONFIRM_PATH: &str = "settlement-info-confirm";
const ORDER_INSERT_PATH: &str = "order-insert";

#[derive(Debug, Clone)]
pub struct BridgeGateway {
    base_url: String,
    client: Client,
}

impl BridgeGateway {
    /// Create a bridge client; `timeout` bounds every HTTP round trip
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> GatewayResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> GatewayResult<GatewayReply> {
        let response = self.client.post(self.url(path)).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct WireSettlementConfirm<'a> {
    #[serde(rename = "BrokerID")]
    broker_id: &'a str,
    #[serde(rename = "InvestorID")]
    investor_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct WireInputOrder<'a> {
    #[serde(rename = "BrokerID")]
    broker_id: &'a str,
    #[serde(rename = "InvestorID")]
    investor_id: &'a str,
    #[serde(rename = "InstrumentID")]
    instrument_id: &'a str,
    order_ref: &'a str,
    #[serde(rename = "UserID")]
    user_id: &'a str,
    order_price_type: char,
    direction: char,
    comb_offset_flag: char,
    comb_hedge_flag: char,
    limit_price: f64,
    volume_total_original: u32,
    time_condition: char,
    #[serde(rename = "GTDDate")]
    gtd_date: &'a str,
    volume_condition: char,
    min_volume: u32,
    contingent_condition: char,
    stop_price: f64,
    force_close_reason: char,
    is_auto_suspend: i32,
    business_unit: &'a str,
    #[serde(rename = "RequestID")]
    request_id: i32,
    user_force_close: i32,
    is_swap_order: i32,
}

impl<'a> From<&'a InputOrder> for WireInputOrder<'a> {
    fn from(order: &'a InputOrder) -> Self {
        Self {
            broker_id: &order.broker_id,
            investor_id: &order.investor_id,
            instrument_id: order.instrument.as_str(),
            order_ref: &order.order_ref,
            user_id: &order.user_id,
            order_price_type: order.price_type.code(),
            direction: direction_code(order.direction),
            comb_offset_flag: order.offset.code(),
            comb_hedge_flag: order.hedge.code(),
            limit_price: order.limit_price.to_f64(),
            volume_total_original: order.volume,
            time_condition: order.time_condition.code(),
            gtd_date: &order.gtd_date,
            volume_condition: order.volume_condition.code(),
            min_volume: order.min_volume,
            contingent_condition: order.contingent_condition.code(),
            stop_price: order.stop_price.to_f64(),
            force_close_reason: order.force_close_reason.code(),
            is_auto_suspend: i32::from(order.is_auto_suspend),
            business_unit: &order.business_unit,
            request_id: order.request_id,
            user_force_close: i32::from(order.user_force_close),
            is_swap_order: i32::from(order.is_swap_order),
        }
    }
}

impl TradingGateway for BridgeGateway {
    async fn confirm_settlement(&self, request: &SettlementConfirm) -> GatewayResult<GatewayReply> {
        let body = WireSettlementConfirm {
            broker_id: &request.broker_id,
            investor_id: &request.investor_id,
        };
        debug!("Bridge settlement confirm for investor {}", request.investor_id);
        self.post(SETTLEMENT_CONFIRM_PATH, &body).await
    }

    async fn insert_order(&self, order: &InputOrder) -> GatewayResult<GatewayReply> {
        let body = WireInputOrder::from(order);
        debug!("Bridge order insert ref={}", order.order_ref);
        self.post(ORDER_INSERT_PATH, &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::OffsetFlag;
    use crate::types::{Direction, Instrument};

    #[test]
    fn test_wire_order_uses_venue_field_names() {
        let order = InputOrder::market(
            "9999",
            "000001",
            Instrument::new("rb2410"),
            "000000000012",
            Direction::Sell,
            OffsetFlag::Close,
            2,
        );
        let json = serde_json::to_value(WireInputOrder::from(&order)).unwrap();

        assert_eq!(json["BrokerID"], "9999");
        assert_eq!(json["InstrumentID"], "rb2410");
        assert_eq!(json["OrderRef"], "000000000012");
        assert_eq!(json["Direction"], "1");
        assert_eq!(json["CombOffsetFlag"], "1");
        assert_eq!(json["CombHedgeFlag"], "1");
        assert_eq!(json["VolumeTotalOriginal"], 2);
        assert_eq!(json["MinVolume"], 2);
        assert_eq!(json["GTDDate"], "");
        assert_eq!(json["IsSwapOrder"], 0);
    }

    #[test]
    fn test_base_url_is_normalised() {
        let gateway = BridgeGateway::new("http://127.0.0.1:8600/", Duration::from_secs(1)).unwrap();
        assert_eq!(gateway.url(ORDER_INSERT_PATH), "http://127.0.0.1:8600/order-insert");
    }

    #[test]
    fn test_reply_parsing() {
        let reply: GatewayReply = serde_json::from_str(
            r#"{"error_id": 0, "error_msg": "", "fills": [{"price": 3512.0, "volume": 2}]}"#,
        )
        .unwrap();
        assert!(reply.is_accepted());
        assert_eq!(reply.fills[0].volume, 2);

        let rejected: GatewayReply =
            serde_json::from_str(r#"{"error_id": 31, "error_msg": "insufficient margin"}"#).unwrap();
        assert!(!rejected.is_accepted());
        assert!(rejected.fills.is_empty());
    }
}
