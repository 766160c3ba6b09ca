mod common;

use chrono::{TimeZone, Utc};
use common::{channel_connector, eth_btc, rest_connector, rest_order, ws_order, MockChannel, MockRest};
use gatex::core::cache::SharedCaches;
use gatex::core::errors::ExchangeError;
use gatex::core::traits::OrderPlacer;
use gatex::core::types::{
    CancelRequest, FeeRequest, FeeType, ModifyRequest, OrderRequest, OrderSide, OrderStatus,
    OrderType, OrdersRequest, Symbol,
};
use gatex::exchanges::gateio::{GateConnector, GateRest};
use rust_decimal_macros::dec;
use serde_json::json;
use std::sync::Arc;

const BUY: &str = "/api2/1/private/buy";
const CANCEL_ORDER: &str = "/api2/1/private/cancelOrder";
const CANCEL_ALL_ORDERS: &str = "/api2/1/private/cancelAllOrders";
const OPEN_ORDERS: &str = "/api2/1/private/openOrders";
const TRADE_HISTORY: &str = "/api2/1/private/tradeHistory";
const MARKET_INFO: &str = "/api2/1/marketinfo";

fn ltc_btc() -> Symbol {
    Symbol::new("LTC", "BTC").unwrap()
}

fn open_orders_body() -> serde_json::Value {
    json!({
        "result": "true",
        "orders": [
            rest_order("101", "eth_btc", "buy", "open", 1_520_000_000),
            rest_order("102", "ltc_btc", "sell", "open", 1_520_000_100),
            rest_order("103", "eth_btc", "ask", "cancelled", 1_520_000_200)
        ]
    })
}

fn fee_request(fee_type: FeeType) -> FeeRequest {
    FeeRequest {
        fee_type,
        pair: eth_btc(),
        price: dec!(0.05),
        amount: dec!(10),
    }
}

fn market_info_body() -> serde_json::Value {
    json!({
        "result": "true",
        "pairs": [
            {"eth_btc": {"decimal_places": 6, "min_amount": 0.0001, "fee": 0.15}},
            {"ltc_btc": {"decimal_places": 6, "min_amount": 0.01, "fee": 0.2}}
        ]
    })
}

#[cfg(test)]
mod trading_tests {
    use super::*;

    #[tokio::test]
    async fn test_submit_limit_order() {
        let rest = MockRest::new();
        rest.respond(
            BUY,
            json!({"result": "true", "orderNumber": 123456, "leftAmount": "0", "filledAmount": "1"}),
        );
        let gate = rest_connector(&rest, vec![]);

        let response = gate
            .submit_order(OrderRequest {
                pair: eth_btc(),
                side: OrderSide::Buy,
                order_type: OrderType::Limit,
                amount: dec!(1.000),
                price: dec!(0.0500),
            })
            .await
            .unwrap();

        assert_eq!(response.order_id.as_deref(), Some("123456"));
        assert!(response.is_placed);
        assert!(response.fully_matched);
        assert_eq!(
            rest.params_of(BUY)[0],
            vec![
                ("currencyPair".to_string(), "eth_btc".to_string()),
                ("rate".to_string(), "0.05".to_string()),
                ("amount".to_string(), "1".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_market_order_never_reaches_the_exchange() {
        let rest = MockRest::new();
        let gate = rest_connector(&rest, vec![]);

        let err = gate
            .submit_order(OrderRequest {
                pair: eth_btc(),
                side: OrderSide::Sell,
                order_type: OrderType::Market,
                amount: dec!(1),
                price: dec!(0),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ExchangeError::NotSupported(_)));
        assert_eq!(rest.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_cancel_order_requires_numeric_id() {
        let rest = MockRest::new();
        rest.respond(CANCEL_ORDER, json!({"result": "true", "message": "Success"}));
        let gate = rest_connector(&rest, vec![]);

        let err = gate
            .cancel_order(CancelRequest {
                order_id: "abc".to_string(),
                pair: eth_btc(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidParameters(_)));

        gate.cancel_order(CancelRequest {
            order_id: "101".to_string(),
            pair: eth_btc(),
        })
        .await
        .unwrap();
        assert_eq!(
            rest.params_of(CANCEL_ORDER)[0],
            vec![
                ("orderNumber".to_string(), "101".to_string()),
                ("currencyPair".to_string(), "eth_btc".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_cancel_all_reports_failures_per_pair() {
        let rest = MockRest::new();
        rest.respond(OPEN_ORDERS, open_orders_body());
        rest.respond(CANCEL_ALL_ORDERS, json!({"result": "true"}));
        rest.respond_for_pair(
            CANCEL_ALL_ORDERS,
            "ltc_btc",
            json!({"result": "false", "code": 17, "message": "Error: cancel failed"}),
        );
        let gate = rest_connector(&rest, vec![]);

        let response = gate.cancel_all_orders(None).await.unwrap();

        assert_eq!(rest.calls_to(CANCEL_ALL_ORDERS), 2);
        assert_eq!(response.status.len(), 1);
        assert!(response.status["ltc_btc"].contains("cancel failed"));
    }

    #[tokio::test]
    async fn test_cancel_all_respects_pair_filter() {
        let rest = MockRest::new();
        rest.respond(OPEN_ORDERS, open_orders_body());
        rest.respond(CANCEL_ALL_ORDERS, json!({"result": "true"}));
        let gate = rest_connector(&rest, vec![]);

        let response = gate.cancel_all_orders(Some(&eth_btc())).await.unwrap();

        assert!(response.status.is_empty());
        assert_eq!(
            rest.params_of(CANCEL_ALL_ORDERS),
            vec![vec![
                ("type".to_string(), "-1".to_string()),
                ("currencyPair".to_string(), "eth_btc".to_string()),
            ]]
        );
    }

    #[tokio::test]
    async fn test_cancel_all_ignores_unreadable_order_fields() {
        let rest = MockRest::new();
        rest.respond(
            OPEN_ORDERS,
            json!({
                "result": "true",
                "orders": [
                    rest_order("101", "eth_btc", "buy", "open", 1_520_000_000),
                    rest_order("102", "ltc_btc", "hold", "pending_review", 1_520_000_100)
                ]
            }),
        );
        rest.respond(CANCEL_ALL_ORDERS, json!({"result": "true"}));
        let gate = rest_connector(&rest, vec![]);

        let response = gate.cancel_all_orders(None).await.unwrap();

        assert!(response.status.is_empty());
        let pairs: Vec<String> = rest
            .params_of(CANCEL_ALL_ORDERS)
            .into_iter()
            .map(|params| params[1].1.clone())
            .collect();
        assert_eq!(pairs, vec!["eth_btc".to_string(), "ltc_btc".to_string()]);
    }

    #[tokio::test]
    async fn test_order_info_scans_open_orders() {
        let rest = MockRest::new();
        rest.respond(OPEN_ORDERS, open_orders_body());
        let gate = rest_connector(&rest, vec![]);

        let order = gate.get_order_info("102").await.unwrap();
        assert_eq!(order.pair, ltc_btc());
        assert_eq!(order.side, OrderSide::Sell);
        assert_eq!(order.amount, dec!(2));
        assert_eq!(order.executed_amount, dec!(0.5));
        assert_eq!(order.remaining_amount, dec!(1.5));

        let err = gate.get_order_info("999").await.unwrap_err();
        assert!(matches!(err, ExchangeError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_polled_active_orders_are_filtered() {
        let rest = MockRest::new();
        rest.respond(OPEN_ORDERS, open_orders_body());
        let gate = rest_connector(&rest, vec![]);

        let all = gate
            .get_active_orders(&OrdersRequest::default())
            .await
            .unwrap();
        let ids: Vec<_> = all.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["101", "102"]);

        let filter = OrdersRequest {
            side: Some(OrderSide::Sell),
            start: Some(Utc.timestamp_opt(1_520_000_050, 0).unwrap()),
            ..OrdersRequest::default()
        };
        let sells = gate.get_active_orders(&filter).await.unwrap();
        assert_eq!(sells.len(), 1);
        assert_eq!(sells[0].id, "102");
    }

    #[tokio::test]
    async fn test_realtime_active_orders_are_paginated() {
        let rest = MockRest::new();
        let channel = Arc::new(MockChannel::new(true));
        channel.push_page((0..100).map(|i| ws_order(i, "ETH_BTC", 0, "10", "4")).collect());
        channel.push_page((100..200).map(|i| ws_order(i, "ETH_BTC", 1, "10", "4")).collect());
        channel.push_page((200..237).map(|i| ws_order(i, "ETH_BTC", 0, "10", "4")).collect());
        let gate = channel_connector(&rest, channel.clone(), vec![]);

        let orders = gate
            .get_active_orders(&OrdersRequest::for_pair(eth_btc()))
            .await
            .unwrap();

        assert_eq!(orders.len(), 237);
        assert!(orders.iter().all(|o| o.status == OrderStatus::Open));
        assert!(orders.iter().all(|o| o.remaining_amount == dec!(6)));
        assert_eq!(orders[150].side, OrderSide::Sell);
        assert_eq!(
            channel.queries(),
            vec![
                ("ETH_BTC".to_string(), 0, 100),
                ("ETH_BTC".to_string(), 100, 100),
                ("ETH_BTC".to_string(), 200, 100),
            ]
        );
        assert_eq!(rest.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_full_pages_end_on_an_empty_one() {
        let rest = MockRest::new();
        let channel = Arc::new(MockChannel::new(true));
        for page in 0..3u64 {
            channel.push_page(
                (page * 100..page * 100 + 100)
                    .map(|i| ws_order(i, "ETH_BTC", 0, "1", "0"))
                    .collect(),
            );
        }
        channel.push_page(vec![]);
        let gate = channel_connector(&rest, channel.clone(), vec![]);

        let orders = gate
            .get_active_orders(&OrdersRequest::default())
            .await
            .unwrap();

        assert_eq!(orders.len(), 300);
        assert_eq!(channel.queries().len(), 4);
        assert_eq!(channel.queries()[0].0, "");
    }

    #[tokio::test]
    async fn test_page_failure_discards_partial_results() {
        let rest = MockRest::new();
        rest.respond(OPEN_ORDERS, open_orders_body());
        let channel = Arc::new(MockChannel::new(true));
        channel.push_page((0..100).map(|i| ws_order(i, "ETH_BTC", 0, "1", "0")).collect());
        channel.push_failure("connection reset");
        let gate = channel_connector(&rest, channel, vec![]);

        let err = gate
            .get_active_orders(&OrdersRequest::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ExchangeError::NetworkError(_)));
        assert_eq!(rest.calls_to(OPEN_ORDERS), 0);
    }

    #[tokio::test]
    async fn test_unknown_side_code_fails_the_batch() {
        let rest = MockRest::new();
        let channel = Arc::new(MockChannel::new(true));
        channel.push_page(vec![
            ws_order(1, "ETH_BTC", 0, "1", "0"),
            ws_order(2, "ETH_BTC", 2, "1", "0"),
        ]);
        let gate = channel_connector(&rest, channel, vec![]);

        let err = gate
            .get_active_orders(&OrdersRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExchangeError::UnrecognizedEnum { ref value, .. } if value == "2"
        ));
    }

    #[tokio::test]
    async fn test_overfilled_order_is_malformed() {
        let rest = MockRest::new();
        let channel = Arc::new(MockChannel::new(true));
        channel.push_page(vec![ws_order(1, "ETH_BTC", 0, "1", "1.5")]);
        let gate = channel_connector(&rest, channel, vec![]);

        let err = gate
            .get_active_orders(&OrdersRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_unknown_rest_status_is_unrecognized() {
        let rest = MockRest::new();
        rest.respond(
            OPEN_ORDERS,
            json!({"result": "true", "orders": [rest_order("1", "eth_btc", "buy", "frozen", 1)]}),
        );
        let gate = rest_connector(&rest, vec![]);

        let err = gate
            .get_active_orders(&OrdersRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::UnrecognizedEnum { .. }));
    }

    #[tokio::test]
    async fn test_order_history_per_pair() {
        let rest = MockRest::new();
        rest.respond_for_pair(
            TRADE_HISTORY,
            "eth_btc",
            json!({"result": "true", "trades": [
                {"orderid": "7", "pair": "eth_btc", "type": "buy", "rate": "0.05",
                 "amount": "1", "time_unix": 1_520_000_000}
            ]}),
        );
        rest.respond_for_pair(
            TRADE_HISTORY,
            "ltc_btc",
            json!({"result": "true", "trades": [
                {"orderNumber": 8, "pair": "ltc_btc", "type": "sell", "rate": "0.01",
                 "amount": "3", "time_unix": "1520000100"}
            ]}),
        );
        let gate = rest_connector(&rest, vec![]);

        let filter = OrdersRequest {
            pairs: vec![eth_btc(), ltc_btc()],
            ..OrdersRequest::default()
        };
        let history = gate.get_order_history(&filter).await.unwrap();

        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|o| o.status == OrderStatus::Filled));
        assert!(history.iter().all(|o| o.remaining_amount == dec!(0)));
        assert_eq!(history[1].id, "8");
        assert_eq!(history[1].executed_amount, dec!(3));
    }

    #[tokio::test]
    async fn test_order_history_needs_a_pair() {
        let rest = MockRest::new();
        let gate = rest_connector(&rest, vec![]);

        let err = gate
            .get_order_history(&OrdersRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidParameters(_)));
        assert_eq!(rest.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_modify_is_not_supported() {
        let gate = rest_connector(&MockRest::new(), vec![]);
        let err = gate
            .modify_order(ModifyRequest {
                order_id: "1".to_string(),
                pair: eth_btc(),
                price: Some(dec!(0.06)),
                amount: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::NotSupported(_)));
    }

    #[tokio::test]
    async fn test_trade_fee_uses_the_live_schedule() {
        let rest = MockRest::new();
        rest.respond(MARKET_INFO, market_info_body());
        let gate = rest_connector(&rest, vec![]);

        let fee = gate
            .get_fee_by_type(&fee_request(FeeType::Trade))
            .await
            .unwrap();

        // 0.15% of 0.05 * 10
        assert_eq!(fee, dec!(0.00075));
        assert_eq!(rest.calls_to(MARKET_INFO), 1);
    }

    #[tokio::test]
    async fn test_trade_fee_without_credentials_is_estimated_offline() {
        let rest = MockRest::new();
        rest.respond(MARKET_INFO, market_info_body());
        let gate = GateConnector::new_without_channel(
            GateRest::new(rest.clone(), rest.clone()).with_authentication(false),
            SharedCaches::default(),
            vec![],
        );

        let fee = gate
            .get_fee_by_type(&fee_request(FeeType::Trade))
            .await
            .unwrap();

        assert_eq!(fee, dec!(0.001));
        assert_eq!(rest.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_offline_fee_never_calls_the_exchange() {
        let rest = MockRest::new();
        let gate = rest_connector(&rest, vec![]);

        let fee = gate
            .get_fee_by_type(&fee_request(FeeType::OfflineTrade))
            .await
            .unwrap();

        assert_eq!(fee, dec!(0.001));
        assert_eq!(rest.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_trade_fee_for_unlisted_pair_is_not_found() {
        let rest = MockRest::new();
        rest.respond(MARKET_INFO, market_info_body());
        let gate = rest_connector(&rest, vec![]);
        let mut request = fee_request(FeeType::Trade);
        request.pair = Symbol::new("DOGE", "BTC").unwrap();

        let err = gate.get_fee_by_type(&request).await.unwrap_err();
        assert!(matches!(err, ExchangeError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_withdrawal_fee_is_not_supported() {
        let rest = MockRest::new();
        let gate = rest_connector(&rest, vec![]);

        let err = gate
            .get_fee_by_type(&fee_request(FeeType::Withdrawal))
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::NotSupported(_)));
        assert_eq!(rest.total_calls(), 0);
    }
}
