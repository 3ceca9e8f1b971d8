use coop_ws::config::ServerConfig;
use coop_ws::origin::OriginMatcher;
use coop_ws::server::serve;
use log::*;

#[tokio::main]
async fn main() {
    env_logger::init();

    let addr = "127.0.0.1:8080";
    let config = ServerConfig::new().with_allowed_origins(vec![
        OriginMatcher::exact("http://localhost:8080"),
        OriginMatcher::pattern(r"https://.*\.example\.com").expect("valid pattern"),
    ]);

    info!("server started on {addr}");

    if let Err(err) = serve(addr, config, |ms| {
        Box::pin(async move {
            loop {
                let message = ms.receive_message().await?;
                info!("message from {:?}: {message}", ms.peer_addr());
                ms.send_message(&message).await?;
            }
        })
    })
    .await
    {
        eprintln!("could not start the server due to: {err}");
    }
}
