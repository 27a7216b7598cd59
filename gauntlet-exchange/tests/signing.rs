use gauntlet_exchange::{
    bybit::{
        model::{
            balance::GetWalletBalance,
            order::{PlaceOrder, PlaceOrderBody, Side},
        },
        RequestSigner, ResponseParser, RECV_WINDOW,
    },
    ApiCredentials,
};
use gauntlet_integration::protocol::http::{
    client::SignedClient,
    signer::{hmac_sha256_digest, Encoder, HexEncoder},
};
use rust_decimal_macros::dec;

fn client() -> SignedClient<'static, RequestSigner, ResponseParser> {
    SignedClient::new(
        "https://api.bybit.com",
        RequestSigner::new(ApiCredentials::new("test-api-key", "test-api-secret")),
        ResponseParser,
    )
}

/// The signature must cover `timestamp + api_key + recv_window + query` for GET
/// requests, with the digest hex-encoded in the sign header.
#[test]
fn get_request_signature_covers_query_string() {
    let request = client().prepare(GetWalletBalance::usdt()).unwrap();

    assert_eq!(request.method(), reqwest::Method::GET);
    assert_eq!(request.url().path(), "/v5/account/wallet-balance");

    let headers = request.headers();
    let timestamp = headers["X-BAPI-TIMESTAMP"].to_str().unwrap();
    let signature = headers["X-BAPI-SIGN"].to_str().unwrap();
    assert_eq!(headers["X-BAPI-API-KEY"], "test-api-key");
    assert_eq!(headers["X-BAPI-RECV-WINDOW"], RECV_WINDOW);

    let query = request.url().query().unwrap();
    assert!(query.contains("accountType=UNIFIED"));

    let sign_input = format!("{timestamp}test-api-key{RECV_WINDOW}{query}");
    let expected = HexEncoder.encode(hmac_sha256_digest(
        b"test-api-secret",
        sign_input.as_bytes(),
    ));
    assert_eq!(signature, expected);
}

/// POST signatures cover the raw minified JSON body, and the signed bytes are the
/// bytes that travel.
#[test]
fn post_request_signature_covers_minified_body() {
    let body = PlaceOrderBody::market("BTCUSDT", Side::Sell, dec!(0.5), true);
    let request = client().prepare(PlaceOrder { body }).unwrap();

    assert_eq!(request.method(), reqwest::Method::POST);
    assert_eq!(request.url().path(), "/v5/order/create");
    assert_eq!(request.headers()["content-type"], "application/json");

    let payload = request.body().and_then(|b| b.as_bytes()).unwrap();
    let payload = std::str::from_utf8(payload).unwrap();
    // Minified: no spaces between tokens
    assert!(!payload.contains(": "));
    assert!(payload.contains(r#""symbol":"BTCUSDT""#));
    assert!(payload.contains(r#""reduceOnly":true"#));

    let headers = request.headers();
    let timestamp = headers["X-BAPI-TIMESTAMP"].to_str().unwrap();
    let signature = headers["X-BAPI-SIGN"].to_str().unwrap();

    let sign_input = format!("{timestamp}test-api-key{RECV_WINDOW}{payload}");
    let expected = HexEncoder.encode(hmac_sha256_digest(
        b"test-api-secret",
        sign_input.as_bytes(),
    ));
    assert_eq!(signature, expected);
}
