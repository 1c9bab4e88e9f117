//! End-to-end calls over real ZeroMQ sockets on loopback.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use bytes::Bytes;
use zeromq::{Endpoint, RouterSocket, Socket, SocketRecv, SocketSend};
use zrapi_rpc::{CborCodec, ClientConfig, Codec, Error, Response, RpcClient, Value};

/// Reply server on a ROUTER socket, so requesters may come and go.
///
/// Each request arrives as `[peer, "", payload]`; the reply reuses the
/// first two frames as its envelope. Replies by `func`:
/// - `echo`: returns `[args...]`
/// - `fail`: fails with a byte-string error
/// - `garbage`: replies with bytes that are not CBOR
/// - `slow`: echoes after 300 ms
fn spawn_server() -> u16 {
    let (port_tx, port_rx) = mpsc::channel();

    thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async move {
            let mut socket = RouterSocket::new();
            let port = match socket.bind("tcp://127.0.0.1:0").await.unwrap() {
                Endpoint::Tcp(_, port) => port,
                other => panic!("unexpected endpoint {other:?}"),
            };
            port_tx.send(port).unwrap();

            let codec = CborCodec::new();
            while let Ok(mut envelope) = socket.recv().await {
                let payload = envelope.split_off(2);
                let request = codec.decode(&payload.get(0).unwrap()[..]).unwrap();
                let func = request.get("func").unwrap().as_text().unwrap().to_string();
                let args = request.get("args").cloned().unwrap_or_default();

                let reply = match func.as_str() {
                    "fail" => {
                        let error = Value::bytes(b"no such object".to_vec());
                        codec.encode(&Response::failure(Some(error)).into_value())
                    }
                    "garbage" => Ok(vec![0xff]),
                    "slow" => {
                        tokio::time::sleep(Duration::from_millis(300)).await;
                        codec.encode(&Response::success(args).into_value())
                    }
                    _ => codec.encode(&Response::success(args).into_value()),
                };

                envelope.push_back(Bytes::from(reply.unwrap()));
                // The requester may be gone after a timeout
                let _ = socket.send(envelope).await;
            }
        });
    });

    port_rx.recv_timeout(Duration::from_secs(5)).unwrap()
}

fn connect(port: u16) -> RpcClient {
    RpcClient::connect(&ClientConfig::new("127.0.0.1", port)).unwrap()
}

#[test]
fn test_echo_over_zmq() {
    let mut client = connect(spawn_server());

    let ret = client
        .call(
            "echo",
            vec![Value::from(1), Value::from("two"), Value::bytes(vec![3])],
        )
        .unwrap();
    assert_eq!(
        ret,
        Value::array([Value::from(1), Value::from("two"), Value::bytes(vec![3])])
    );

    assert_eq!(
        client.call_unpacked("echo", vec![Value::from(7)]).unwrap(),
        Value::Integer(7)
    );
    assert_eq!(client.call_unpacked("echo", Vec::new()).unwrap(), Value::Null);
}

#[test]
fn test_remote_failure_over_zmq() {
    let mut client = connect(spawn_server());

    match client.call("fail", Vec::new()) {
        Err(Error::Remote { message, .. }) => assert_eq!(message, "no such object"),
        other => panic!("Expected Remote error, got {other:?}"),
    }

    assert_eq!(
        client.call_unpacked("echo", vec![Value::from(true)]).unwrap(),
        Value::Bool(true)
    );
}

#[test]
fn test_garbage_reply_over_zmq() {
    let mut client = connect(spawn_server());

    let err = client.call("garbage", Vec::new()).unwrap_err();
    assert!(matches!(err, Error::Decode(_)), "got {err:?}");

    assert_eq!(
        client.call_unpacked("echo", vec![Value::from(1)]).unwrap(),
        Value::Integer(1)
    );
}

#[test]
fn test_timeout_discards_late_reply() {
    let port = spawn_server();
    let config =
        ClientConfig::new("127.0.0.1", port).with_receive_timeout(Duration::from_millis(100));
    let mut client = RpcClient::connect(&config).unwrap();

    let err = client.call("slow", vec![Value::from("stale")]).unwrap_err();
    assert!(matches!(err, Error::Timeout(_)), "got {err:?}");

    // Let the late reply arrive before the next call
    thread::sleep(Duration::from_millis(400));

    let ret = client.call_unpacked("echo", vec![Value::from("fresh")]).unwrap();
    assert_eq!(ret, Value::from("fresh"));
}

#[tokio::test]
async fn test_calls_from_async_context() {
    let mut client = connect(spawn_server());

    let ret = client.call_unpacked("echo", vec![Value::from("inside")]).unwrap();
    assert_eq!(ret, Value::from("inside"));

    drop(client);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_calls_from_spawn_blocking() {
    let port = spawn_server();

    let ret = tokio::task::spawn_blocking(move || {
        let mut client = connect(port);
        client.call_unpacked("echo", vec![Value::from(5)])
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(ret, Value::Integer(5));
}
