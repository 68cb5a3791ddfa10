use std::time::{Duration, Instant};

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

#[derive(Parser)]
#[command(name = "lookup-client")]
#[command(about = "Send queries to a line-lookup server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "127.0.0.1:9997")]
    address: String,

    /// Send each query this many times and report round-trip latency.
    #[arg(short, long, default_value_t = 1)]
    repeat: u32,

    /// Queries to send. Read from stdin, one per line, when none are given.
    queries: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut stream = TcpStream::connect(&cli.address).await?;

    let queries = if cli.queries.is_empty() {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut queries = Vec::new();
        while let Some(line) = lines.next_line().await? {
            queries.push(line);
        }
        queries
    } else {
        cli.queries
    };

    for query in &queries {
        let mut latencies = Vec::with_capacity(cli.repeat as usize);
        let mut response = String::new();
        for _ in 0..cli.repeat.max(1) {
            let start = Instant::now();
            response = send(&mut stream, query).await?;
            latencies.push(start.elapsed());
        }

        print!("{query}: {response}");
        if cli.repeat > 1 {
            print_latency(&latencies);
        }
    }

    Ok(())
}

async fn send(stream: &mut TcpStream, query: &str) -> Result<String, Box<dyn std::error::Error>> {
    stream.write_all(query.as_bytes()).await?;
    let mut buf = vec![0u8; 4096];
    let n = stream.read(&mut buf).await?;
    if n == 0 {
        return Err("server closed the connection".into());
    }
    Ok(String::from_utf8_lossy(&buf[..n]).into_owned())
}

fn print_latency(latencies: &[Duration]) {
    let total: Duration = latencies.iter().sum();
    let average = total / latencies.len() as u32;
    let per_second = latencies.len() as f64 / total.as_secs_f64().max(f64::EPSILON);
    println!(
        "  {} round trips, average {:.4} seconds, {:.1} queries/second",
        latencies.len(),
        average.as_secs_f64(),
        per_second
    );
}
