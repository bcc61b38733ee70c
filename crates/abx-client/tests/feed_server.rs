//! End-to-end tests against an in-process feed server over real TCP.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use abx_client::codec::encode_record;
use abx_client::{JsonFileSink, MemorySink, TcpConnector, run};
use abx_core::{AbxError, Record, Side, Symbol};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Clone, Copy)]
enum Delivery {
    /// One write per frame.
    Whole,
    /// Every frame split across two writes.
    Fragmented,
    /// Stream all: the last frame is cut short before closing.
    Truncated,
    /// Accept and read the request, then never answer.
    Silent,
}

#[derive(Clone)]
struct Script {
    stream: Vec<Record>,
    resend: HashMap<u8, Record>,
    delivery: Delivery,
}

struct FakeServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<[u8; 2]>>>,
}

impl FakeServer {
    async fn start(script: Script) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&requests);

        tokio::spawn(async move {
            loop {
                let Ok((socket, _)) = listener.accept().await else { return };
                let script = script.clone();
                let log = Arc::clone(&log);
                tokio::spawn(async move { serve(socket, script, log).await });
            }
        });

        Self { addr, requests }
    }

    fn connector(&self) -> TcpConnector {
        TcpConnector::new(self.addr.to_string())
    }

    fn requests(&self) -> Vec<[u8; 2]> {
        self.requests.lock().unwrap().clone()
    }
}

async fn write_frame(socket: &mut TcpStream, record: &Record, delivery: Delivery) {
    let frame = encode_record(record);
    match delivery {
        Delivery::Fragmented => {
            socket.write_all(&frame[..6]).await.unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(5)).await;
            socket.write_all(&frame[6..]).await.unwrap();
        }
        _ => socket.write_all(&frame).await.unwrap(),
    }
}

async fn serve(mut socket: TcpStream, script: Script, log: Arc<Mutex<Vec<[u8; 2]>>>) {
    let mut request = [0u8; 2];
    if socket.read_exact(&mut request).await.is_err() {
        return;
    }
    log.lock().unwrap().push(request);

    match (request[0], script.delivery) {
        (_, Delivery::Silent) => tokio::time::sleep(Duration::from_secs(5)).await,
        (1, Delivery::Truncated) => {
            for record in &script.stream {
                write_frame(&mut socket, record, Delivery::Whole).await;
            }
            socket.write_all(&[b'A', b'B', b'C']).await.unwrap();
        }
        (1, delivery) => {
            for record in &script.stream {
                write_frame(&mut socket, record, delivery).await;
            }
        }
        (2, delivery) => {
            if let Some(record) = script.resend.get(&request[1]) {
                write_frame(&mut socket, record, delivery).await;
            }
        }
        _ => {}
    }
    let _ = socket.shutdown().await;
}

fn rec(sequence: u32) -> Record {
    Record {
        symbol: Symbol::from("ABCD"),
        side: if sequence % 2 == 1 { Side::Buy } else { Side::Sell },
        quantity: 100 * sequence,
        price: 5_000 + sequence,
        sequence,
    }
}

fn script(stream: &[u32], resend: &[u32], delivery: Delivery) -> Script {
    Script {
        stream: stream.iter().map(|&s| rec(s)).collect(),
        resend: resend.iter().map(|&s| (s as u8, rec(s))).collect(),
        delivery,
    }
}

fn sequences(records: &[Record]) -> Vec<u32> {
    records.iter().map(|r| r.sequence).collect()
}

#[tokio::test]
async fn recovers_gaps_and_writes_sorted_json() {
    let server = FakeServer::start(script(&[1, 2, 4, 6, 5, 8], &[3, 7], Delivery::Whole)).await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("output.json");
    let mut sink = JsonFileSink::new(&path);

    let report = run(&server.connector(), &mut sink).await.unwrap();
    assert_eq!(report.streamed, 6);
    assert_eq!(report.max_sequence, 8);
    assert_eq!(report.recovery.recovered, vec![3, 7]);
    assert!(report.complete);
    assert_eq!(server.requests(), vec![[1, 0], [2, 3], [2, 7]]);

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let arr = json.as_array().unwrap();
    let seqs: Vec<u64> = arr.iter().map(|v| v["sequence"].as_u64().unwrap()).collect();
    assert_eq!(seqs, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    assert_eq!(arr[2]["symbol"], "ABCD");
    assert_eq!(arr[2]["side"], "B");
    assert_eq!(arr[2]["quantity"], 300);
    assert_eq!(arr[2]["price"], 5_003);
}

#[tokio::test]
async fn missing_resend_is_reported_not_fatal() {
    let server = FakeServer::start(script(&[1, 2, 3, 5], &[], Delivery::Whole)).await;
    let mut sink = MemorySink::new();

    let report = run(&server.connector(), &mut sink).await.unwrap();
    assert_eq!(report.recovery.unrecovered, vec![4]);
    assert_eq!(report.emitted, 4);
    assert!(!report.complete);

    let batch = sink.last_batch().unwrap();
    assert_eq!(sequences(batch), vec![1, 2, 3, 5]);
    assert_eq!(batch[0].side, Side::Buy);
    assert_eq!(batch[1].side, Side::Sell);
}

#[tokio::test]
async fn fragmented_frames_are_reassembled() {
    let server = FakeServer::start(script(&[1, 3], &[2], Delivery::Fragmented)).await;
    let mut sink = MemorySink::new();

    let report = run(&server.connector(), &mut sink).await.unwrap();
    assert!(report.complete);
    assert_eq!(sink.last_batch().unwrap(), &[rec(1), rec(2), rec(3)]);
}

#[tokio::test]
async fn empty_stream_is_fatal() {
    let server = FakeServer::start(script(&[], &[], Delivery::Whole)).await;
    let mut sink = MemorySink::new();

    let err = run(&server.connector(), &mut sink).await.unwrap_err();
    assert!(matches!(err.downcast_ref::<AbxError>(), Some(AbxError::NoDataReceived)));
    assert!(sink.batches.is_empty());
    assert_eq!(server.requests(), vec![[1, 0]]);
}

#[tokio::test]
async fn truncated_frame_is_fatal() {
    let server = FakeServer::start(script(&[1, 2], &[], Delivery::Truncated)).await;
    let mut sink = MemorySink::new();

    let err = run(&server.connector(), &mut sink).await.unwrap_err();
    assert!(matches!(err.downcast_ref::<AbxError>(), Some(AbxError::Channel(_))));
    assert!(sink.batches.is_empty());
}

#[tokio::test]
async fn silent_server_times_out() {
    let server = FakeServer::start(script(&[1], &[], Delivery::Silent)).await;
    let connector = server.connector().with_recv_timeout(Some(Duration::from_millis(100)));
    let mut sink = MemorySink::new();

    let err = run(&connector, &mut sink).await.unwrap_err();
    assert!(matches!(err.downcast_ref::<AbxError>(), Some(AbxError::Timeout(_))));
    assert!(sink.batches.is_empty());
}

#[tokio::test]
async fn refused_connection_is_fatal() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let connector = TcpConnector::new(addr.to_string()).with_connect_timeout(Some(Duration::from_secs(2)));
    let mut sink = MemorySink::new();
    let err = run(&connector, &mut sink).await.unwrap_err();
    assert!(err.downcast_ref::<AbxError>().is_some_and(AbxError::is_channel));
}
