use std::path::Path;
use std::sync::Arc;

use trackside_ingest::MqttClient;
use trackside_store::TrackStore;

use crate::server::config::AppConfig;

pub async fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("🏥 Trackside Doctor\n");

    print_config_summary(config);

    let mut all_ok = true;

    all_ok &= check_database(config).await;
    all_ok &= check_broker(config).await;

    println!();
    if all_ok {
        println!("✅ All checks passed! Ready to run Trackside.");
    } else {
        println!("⚠️  Some checks failed. Please fix the issues above.");
        std::process::exit(1);
    }

    Ok(())
}

fn print_config_summary(config: &AppConfig) {
    println!("Configuration:");
    println!("  HTTP    {}:{}", config.server.host, config.server.port);
    println!("  Broker  {}:{}", config.mqtt.host, config.mqtt.port);
    println!("  Uplink  {}", config.mqtt.rx_topic);
    println!("  Downlink {}", config.mqtt.tx_topic);
    println!();
}

async fn check_database(config: &AppConfig) -> bool {
    print!("Checking database... ");

    if !Path::new(&config.database.path).exists() {
        println!("ℹ️  Will create {} on first run", config.database.path);
        return true;
    }

    match TrackStore::from_path(Path::new(&config.database.path)).await {
        Ok(store) => match store.ping().await {
            Ok(()) => {
                println!("✅ {}", config.database.path);
                let teams = store.team_count().await.unwrap_or(0);
                let races = store.race_count().await.unwrap_or(0);
                println!("  ℹ️  {} teams, {} races", teams, races);
                true
            }
            Err(e) => {
                println!("❌ Ping failed: {}", e);
                false
            }
        },
        Err(e) => {
            println!("❌ Cannot open: {}", e);
            false
        }
    }
}

async fn check_broker(config: &AppConfig) -> bool {
    print!("Checking MQTT broker... ");

    // Distinct client id so the probe cannot kick a running server off
    // the broker.
    let mut mqtt_config = config.mqtt.clone();
    mqtt_config.client_id = Some(format!("{}-doctor", config.mqtt_client_id()));

    let bus = Arc::new(MqttClient::new(mqtt_config));
    match bus.start().await {
        Ok(()) => {
            println!("✅ Connected to {}:{}", config.mqtt.host, config.mqtt.port);
            bus.stop().await;
            true
        }
        Err(e) => {
            println!("❌ {}", e);
            println!("  The server still starts without a broker, but telemetry will not flow.");
            false
        }
    }
}
