use std::{net::SocketAddr, sync::Arc, time::Duration};

use flakegen::{Poll, Result, SnowflakeGenerator, SnowflakeId, TimeSource};
use tokio::{
    io::AsyncWriteExt,
    net::{TcpListener, TcpStream},
};

use crate::config::ReplyFormat;

/// Back-off after a failed `accept`, e.g. when the process is out of file
/// descriptors.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Accepts connections until `shutdown` resolves, writing one ID to each in
/// `reply_format`.
///
/// Every connection is served on its own task; all tasks share `generator`.
pub async fn serve<G, T>(
    listener: TcpListener,
    generator: Arc<G>,
    reply_format: ReplyFormat,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<()>
where
    G: SnowflakeGenerator<T> + Send + Sync + 'static,
    T: TimeSource + Send + Sync + 'static,
{
    let mut shutdown = std::pin::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => break,
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to accept connection");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                        continue;
                    }
                };

                let generator = Arc::clone(&generator);
                tokio::spawn(async move {
                    handle_connection(stream, peer, &*generator, reply_format).await;
                });
            }
        }
    }

    Ok(())
}

async fn handle_connection<G, T>(
    mut stream: TcpStream,
    peer: SocketAddr,
    generator: &G,
    reply_format: ReplyFormat,
) where
    G: SnowflakeGenerator<T>,
    T: TimeSource,
{
    let id = match next_id(generator).await {
        Ok(id) => id,
        Err(e) => {
            // Dropping the stream closes it without a reply.
            tracing::error!(%peer, error = %e, "failed to generate id");
            return;
        }
    };

    tracing::trace!(%peer, %id, "issuing id");
    let result = async {
        stream.write_all(&reply_format.encode(id)).await?;
        stream.shutdown().await
    }
    .await;

    if let Err(e) = result {
        tracing::debug!(%peer, error = %e, "failed to write id");
    }
}

/// Polls the generator, yielding to the runtime instead of spinning while the
/// current millisecond is exhausted.
async fn next_id<G, T>(generator: &G) -> Result<SnowflakeId>
where
    G: SnowflakeGenerator<T>,
    T: TimeSource,
{
    loop {
        match generator.poll_id()? {
            Poll::Ready { id } => break Ok(id),
            Poll::Pending { .. } => tokio::task::yield_now().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashSet,
        sync::atomic::{AtomicU64, Ordering},
    };

    use flakegen::{LockSnowflakeGenerator, MonotonicClock, NodeId};
    use tokio::{io::AsyncReadExt, sync::oneshot, task::JoinHandle};

    use super::*;

    #[derive(Clone, Default)]
    struct ManualTime(Arc<AtomicU64>);

    impl TimeSource for ManualTime {
        fn current_millis(&self) -> u64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    struct TestServer {
        addr: SocketAddr,
        stop: oneshot::Sender<()>,
        handle: JoinHandle<anyhow::Result<()>>,
    }

    async fn start<T>(time: T, reply_format: ReplyFormat) -> TestServer
    where
        T: TimeSource + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let generator = Arc::new(LockSnowflakeGenerator::new(
            NodeId::try_from(5_i64).unwrap(),
            time,
        ));
        let (stop, stopped) = oneshot::channel();
        let handle = tokio::spawn(serve(listener, generator, reply_format, async {
            let _ = stopped.await;
        }));
        TestServer { addr, stop, handle }
    }

    async fn fetch(addr: SocketAddr) -> Vec<u8> {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        buf
    }

    #[tokio::test]
    async fn each_connection_gets_one_distinct_id() {
        let server = start(MonotonicClock::default(), ReplyFormat::Little).await;

        let mut seen = HashSet::new();
        let mut last = 0;
        for _ in 0..64 {
            let bytes = fetch(server.addr).await;
            let raw = u64::from_le_bytes(bytes.as_slice().try_into().unwrap());
            let id = SnowflakeId::from_raw(raw);

            assert!(id.is_valid());
            assert_eq!(id.node_id(), 5);
            assert!(raw > last);
            assert!(seen.insert(raw));
            last = raw;
        }

        server.stop.send(()).unwrap();
        server.handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn big_endian_reply() {
        let time = ManualTime::default();
        time.0.store(1234, Ordering::SeqCst);
        let server = start(time, ReplyFormat::Big).await;

        let bytes = fetch(server.addr).await;
        let raw = u64::from_be_bytes(bytes.as_slice().try_into().unwrap());
        assert_eq!(raw, SnowflakeId::from_components(1234, 5, 0).to_raw());

        server.stop.send(()).unwrap();
        server.handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn decimal_reply_parses_as_id() {
        let time = ManualTime::default();
        time.0.store(1234, Ordering::SeqCst);
        let server = start(time, ReplyFormat::Decimal).await;

        let first = String::from_utf8(fetch(server.addr).await).unwrap();
        let second = String::from_utf8(fetch(server.addr).await).unwrap();

        let first: SnowflakeId = first.parse().unwrap();
        let second: SnowflakeId = second.parse().unwrap();
        assert_eq!(first, SnowflakeId::from_components(1234, 5, 0));
        assert_eq!(second, SnowflakeId::from_components(1234, 5, 1));
        assert_eq!(first.to_string(), first.to_raw().to_string());

        server.stop.send(()).unwrap();
        server.handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn clock_regression_closes_without_reply() {
        let time = ManualTime::default();
        time.0.store(100, Ordering::SeqCst);
        let server = start(time.clone(), ReplyFormat::Little).await;

        assert_eq!(fetch(server.addr).await.len(), 8);

        time.0.store(99, Ordering::SeqCst);
        assert!(fetch(server.addr).await.is_empty());

        // Service resumes once the clock catches up, continuing the sequence.
        time.0.store(100, Ordering::SeqCst);
        let bytes = fetch(server.addr).await;
        let id = SnowflakeId::from_raw(u64::from_le_bytes(bytes.as_slice().try_into().unwrap()));
        assert_eq!((id.timestamp(), id.sequence()), (100, 1));

        server.stop.send(()).unwrap();
        server.handle.await.unwrap().unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_clients_get_distinct_ids() {
        let server = start(MonotonicClock::default(), ReplyFormat::Little).await;

        let clients: Vec<_> = (0..256)
            .map(|_| tokio::spawn(fetch(server.addr)))
            .collect();

        let mut seen = HashSet::new();
        for client in clients {
            let bytes = client.await.unwrap();
            assert!(seen.insert(u64::from_le_bytes(bytes.as_slice().try_into().unwrap())));
        }
        assert_eq!(seen.len(), 256);

        server.stop.send(()).unwrap();
        server.handle.await.unwrap().unwrap();
    }
}
