/// Entry point of the container stat service.
///
/// Detects the host's cgroup layout and serves per-container resource usage
/// snapshots over HTTP. See [`container_stat::config`] for the environment
/// variables it reads.
///
/// # Examples
///
/// ```bash
/// RUST_LOG=debug CGROUP_HIERARCHY=v2 LISTEN_ADDR=127.0.0.1:3000 cargo run
/// ```
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    container_stat::run().await
}
