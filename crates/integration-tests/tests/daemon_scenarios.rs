//! Daemon Scenarios - typed SDK calls against a fake daemon socket
//!
//! Every catalog method goes over a real Unix socket and is checked on
//! both sides: what the daemon received and what the caller got back.

mod common;

use common::{error, result, DaemonReply, FakeDaemon};
use lightning_rpc_core::ParamStyle;
use lightning_rpc_sdk::{LightningRpc, Method, Params, RouteHop, SdkError};
use serde_json::json;

/// Scenario 1: getinfo decodes all five fields
#[tokio::test]
async fn test_get_info_scenario() {
    let daemon = FakeDaemon::start(|req| {
        result(
            req,
            json!({"id": "03ab..", "port": 9735, "testnet": false, "version": "0.1", "blockheight": 500000}),
        )
    });
    let rpc = LightningRpc::new(daemon.path());

    let info = rpc.get_info().await.unwrap();

    assert_eq!(info.id, "03ab..");
    assert_eq!(info.port, 9735);
    assert!(!info.testnet);
    assert_eq!(info.version, "0.1");
    assert_eq!(info.blockheight, 500000);

    let requests = daemon.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "getinfo");
    assert_eq!(requests[0].jsonrpc, "2.0");

    println!("✅ Scenario 1: getinfo");
}

/// Scenario 2: getroute rejected by the daemon surfaces code and message, no route
#[tokio::test]
async fn test_get_route_no_route_found() {
    let daemon = FakeDaemon::start(|req| error(req, -1, "no route found"));
    let rpc = LightningRpc::new(daemon.path());

    let outcome = rpc.get_route("03cd..", 100000, 1.0).await;

    match outcome {
        Err(SdkError::Rpc {
            method,
            code,
            message,
            ..
        }) => {
            assert_eq!(method, Method::GetRoute);
            assert_eq!(code, -1);
            assert_eq!(message, "no route found");
        }
        other => panic!("expected daemon rejection, got {:?}", other),
    }

    let sent = &daemon.requests()[0];
    assert_eq!(
        sent.params,
        Params::positional([json!("03cd.."), json!(100000), json!(1.0)])
    );

    println!("✅ Scenario 2: getroute no route found");
}

/// Scenario 3: route from getroute is handed back to sendpay unchanged
#[tokio::test]
async fn test_route_then_pay() {
    let daemon = FakeDaemon::start(|req| match req.method.as_str() {
        "getroute" => result(
            req,
            json!({"route": [
                {"id": "02aa", "msatoshi": 100020, "delay": 15, "channel": "100:1:0"},
                {"id": "03cd", "msatoshi": 100000, "delay": 9, "channel": "101:2:1"}
            ]}),
        ),
        "sendpay" => result(req, json!({"preimage": "9f86d081"})),
        _ => error(req, -32601, "Method not found"),
    });
    let rpc = LightningRpc::new(daemon.path());

    let route = rpc.get_route("03cd", 100000, 1.0).await.unwrap();
    assert_eq!(route.hops.len(), 2);
    assert_eq!(
        route.hops[0],
        RouteHop {
            node_id: "02aa".to_string(),
            msatoshi: 100020,
            delay: 15,
            channel: "100:1:0".to_string(),
        }
    );

    let paid = rpc.send_payment(&route.hops, "e3b0c442").await.unwrap();
    assert_eq!(paid.preimage, "9f86d081");

    let sendpay = &daemon.requests()[1];
    assert_eq!(
        sendpay.params,
        Params::positional([
            json!([
                {"id": "02aa", "msatoshi": 100020, "delay": 15, "channel": "100:1:0"},
                {"id": "03cd", "msatoshi": 100000, "delay": 9, "channel": "101:2:1"}
            ]),
            json!("e3b0c442"),
        ])
    );

    println!("✅ Scenario 3: getroute -> sendpay");
}

/// Scenario 4: every catalog method, wire name and parameter style
#[tokio::test]
async fn test_full_catalog_over_socket() {
    let daemon = FakeDaemon::start(|req| {
        let value = match req.method.as_str() {
            "newaddr" => json!({"address": "bc1qxyz"}),
            "getinfo" => json!({"id": "03ab", "port": 9735, "testnet": true, "version": "0.1", "blockheight": 1}),
            "getpeers" => json!({"peers": [{
                "state": "NORMAL", "peerid": "02aa", "connected": true,
                "our_amount": 50000, "their_amount": 0, "our_fee": 10, "their_fee": 0
            }]}),
            "getchannels" => json!({"channels": [
                {"from": "02aa", "to": "03cd", "base_fee": 1, "proportional_fee": 10}
            ]}),
            "getroute" => json!({"route": []}),
            "sendpay" => json!({"preimage": "00"}),
            "getnodes" => json!({"nodes": [{"nodeid": "02aa", "addresses": [
                {"type": "ipv4", "address": "127.0.0.1", "port": 9735}
            ]}]}),
            "invoice" => json!({"rhash": "aa", "paymentKey": "bb"}),
            "connect" | "close" => json!({}),
            "stop" => json!(null),
            _ => return error(req, -32601, "Method not found"),
        };
        result(req, value)
    });
    let rpc = LightningRpc::new(daemon.path());

    assert_eq!(rpc.new_address().await.unwrap().address, "bc1qxyz");
    assert!(rpc.get_info().await.unwrap().testnet);
    assert_eq!(rpc.get_peers().await.unwrap().peers[0].our_amount, 50000);
    assert_eq!(rpc.get_channels().await.unwrap().channels[0].proportional_fee, 10);
    rpc.connect("127.0.0.1", 9735, "0200aabb").await.unwrap();
    rpc.close("02aa").await.unwrap();
    assert!(rpc.get_route("03cd", 1, 0.5).await.unwrap().hops.is_empty());
    assert_eq!(rpc.send_payment(&[], "00").await.unwrap().preimage, "00");
    assert_eq!(rpc.get_nodes().await.unwrap().nodes[0].addresses[0].port, 9735);
    assert_eq!(rpc.invoice(5000, "coffee").await.unwrap().payment_key, "bb");
    rpc.stop().await.unwrap();

    let requests = daemon.requests();
    assert_eq!(requests.len(), Method::ALL.len());
    for (request, method) in requests.iter().zip(Method::ALL) {
        assert_eq!(request.method, method.wire_name());
        assert_eq!(request.params.style(), method.style(), "{}", method);
    }
    assert_eq!(
        requests[4].params,
        Params::positional([json!("127.0.0.1"), json!(9735), json!("0200aabb")])
    );
    assert_eq!(requests[10].params.style(), ParamStyle::Positional);
    assert!(requests[10].params.is_empty());

    // Per-call client: one connection per request
    assert_eq!(daemon.connections(), Method::ALL.len());

    println!("✅ Scenario 4: full catalog");
}

/// Scenario 5: daemon that replies without a trailing newline
#[tokio::test]
async fn test_response_without_newline() {
    let daemon = FakeDaemon::start(|req| {
        DaemonReply::Raw(
            json!({"id": req.id, "result": {"address": "bc1qraw"}})
                .to_string()
                .into_bytes(),
        )
    });
    let rpc = LightningRpc::new(daemon.path());

    assert_eq!(rpc.new_address().await.unwrap().address, "bc1qraw");

    println!("✅ Scenario 5: unterminated response");
}

/// Scenario 6: persistent facade shares one socket
#[tokio::test]
async fn test_persistent_facade() {
    let daemon = FakeDaemon::start(|req| result(req, json!({"nodes": []})));
    let rpc = LightningRpc::persistent(daemon.path());

    for _ in 0..3 {
        rpc.get_nodes().await.unwrap();
    }
    rpc.shutdown().await;

    assert_eq!(daemon.connections(), 1);
    assert_eq!(daemon.requests().len(), 3);

    println!("✅ Scenario 6: persistent facade");
}
