//! Decode the request frames stored in a file and log what they touch.
//!
//! Usage: `frame-inspect <frames-file> [config.json]`
use bytes::Bytes;
use kafka_proxy_codec::prelude::*;

#[tokio::main]
async fn main() -> std::result::Result<(), ()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .compact()
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .init();

    let mut args = std::env::args().skip(1);
    let path = args.next().ok_or_else(|| {
        tracing::error!("usage: frame-inspect <frames-file> [config.json]");
    })?;

    let config = match args.next() {
        Some(config_path) => {
            let json = tokio::fs::read_to_string(&config_path)
                .await
                .map_err(|err| tracing::error!("Could not read {}: {:?}", config_path, err))?;
            CodecConfig::from_json(&json).map_err(|err| tracing::error!("{}", err))?
        }
        None => CodecConfig::from_env().map_err(|err| tracing::error!("{}", err))?,
    };

    let mut file = tokio::fs::File::open(&path)
        .await
        .map_err(|err| tracing::error!("Could not open {}: {:?}", path, err))?;

    let mut count = 0;
    loop {
        let frame = match read_request(&mut file, &config).await {
            Ok(frame) => frame.freeze(),
            Err(Error::IoError(std::io::ErrorKind::UnexpectedEof)) => break,
            Err(err) => {
                tracing::error!("Stopping at frame {}: {}", count, err);
                return Err(());
            }
        };
        count += 1;
        inspect(count, frame);
    }

    tracing::info!("Inspected {} frames", count);
    Ok(())
}

fn inspect(index: usize, frame: Bytes) {
    let key_version = match RequestKeyVersion::decode(&frame) {
        Ok(key_version) => key_version,
        Err(err) => {
            tracing::warn!("Frame {}: unreadable header: {}", index, err);
            return;
        }
    };

    let decoded = match key_version.request_header_version() {
        Ok(1) => Request::decode(frame).map(|r| (r.correlation_id, summary(&r))),
        Ok(_) => RequestV2::decode(frame).map(|r| (r.correlation_id, summary(&r))),
        Err(err) => Err(err),
    };

    match decoded {
        Ok((correlation_id, summary)) => tracing::info!(
            "Frame {}: {:?} v{} correlation id {} {}",
            index,
            ApiKey::from_i16(key_version.api_key),
            key_version.api_version,
            correlation_id,
            summary
        ),
        Err(err) => tracing::warn!(
            "Frame {}: skipping api key {} version {}: {}",
            index,
            key_version.api_key,
            key_version.api_version,
            err
        ),
    }
}

fn summary(request: &impl TopicsAndGroups) -> String {
    let groups = request.consumer_groups();
    if request.all_topics() {
        format!("all topics groups {:?}", groups)
    } else {
        format!("topics {:?} groups {:?}", request.topics(), groups)
    }
}
