//! End-to-end tests through the public file-level API

use ekflog::format::binary::{BinaryCodec, ByteOrder};
use ekflog::format::text::TextCodec;
use ekflog::record::*;
use ekflog::{decode, encode, EkfLogError, FormatRouter, StreamIntegrity};
use tempfile::TempDir;

fn flight_records() -> Vec<LogRecord> {
    vec![
        LogRecord::time(1, 130_000_000),
        LogRecord::imu(
            2,
            130_002_000,
            ImuData {
                accel: Vector3::new(0, 0, -9806),
                gyro: Vector3::default(),
                delta_angle: Vector3::default(),
                mag: Vector3::new(275, -19, -161),
            },
        ),
        LogRecord::gps(
            3,
            130_004_000,
            GpsData {
                position: GlobalPosition {
                    latitude: 502_647_000,
                    longitude: 190_216_000,
                    altitude: 271_000,
                },
                horizontal_accuracy: 1_000,
                velocity_accuracy: 1_000,
                fix: 1,
                satellite_count: 6,
                velocity: Ned::new(0, 0, 0),
            },
        ),
        LogRecord::baro(
            4,
            130_006_000,
            BaroData {
                pressure: 101_325,
                temperature: 297_150,
            },
        ),
    ]
}

#[test]
fn binary_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("flight.bin");
    let records = flight_records();

    assert_eq!(encode(&path, &records).unwrap(), 4);
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 13 + 55 + 55 + 21);
    assert_eq!(decode(&path).unwrap(), records);
}

#[test]
fn text_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("flight.csv");
    let records = flight_records();

    encode(&path, &records).unwrap();
    assert_eq!(decode(&path).unwrap(), records);
}

#[test]
fn convert_binary_to_text_and_back() {
    let dir = TempDir::new().unwrap();
    let bin = dir.path().join("flight.bin");
    let csv = dir.path().join("flight.csv");
    let back = dir.path().join("back.bin");
    let router = FormatRouter::default();

    router.encode(&bin, flight_records()).unwrap();
    router.convert(&bin, &csv).unwrap();
    router.convert(&csv, &back).unwrap();

    assert_eq!(std::fs::read(&bin).unwrap(), std::fs::read(&back).unwrap());
}

#[test]
fn truncated_binary_file_reports_last_id() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("flight.bin");
    encode(&path, flight_records()).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    std::fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();

    match decode(&path) {
        Err(EkfLogError::Truncation { last_id, .. }) => assert_eq!(last_id, Some(3)),
        other => panic!("expected truncation, got {:?}", other),
    }
}

#[test]
fn text_file_with_foreign_lines_still_decodes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("flight.csv");
    std::fs::write(
        &path,
        "1,Time,130000000\n2,Airspeed,130001000,17\n3,Time,130002000\n",
    )
    .unwrap();

    let records = decode(&path).unwrap();
    let integrity = StreamIntegrity::new(&records);

    assert_eq!(records.len(), 2);
    assert_eq!(integrity.missing_count_at(1), Some(1));
    assert_eq!(integrity.total_missing(), 1);
    assert!(matches!(
        integrity.index_of(&LogRecord::time(2, 0)),
        Err(EkfLogError::NotFound(2))
    ));
}

#[test]
fn configured_codecs_are_used() {
    let dir = TempDir::new().unwrap();
    let bin = dir.path().join("flight.bin");
    let router = FormatRouter::new(
        BinaryCodec::with_byte_order(ByteOrder::Big),
        TextCodec::new(b'|'),
    );

    router.encode(&bin, flight_records()).unwrap();

    // Big-endian id 1 starts with three zero bytes
    let bytes = std::fs::read(&bin).unwrap();
    assert_eq!(&bytes[..5], &[0, 0, 0, 1, b'T']);
    assert_eq!(router.decode(&bin).unwrap(), flight_records());
}
