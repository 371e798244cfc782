use tokio_modbus::{Exception, Request};
use vfd_modbus::{
    command::Command,
    drive::{self, read_telemetry},
    registers::StatusBlock,
    simulator::SimulatedDrive,
    DeviceConfig, ReadFunction, TransportError,
};

fn drive_with(config: &DeviceConfig, fault_code: u16) -> SimulatedDrive {
    SimulatedDrive::vpc_m0701s(config, StatusBlock::default(), fault_code, ReadFunction::Auto)
}

#[tokio::test]
async fn frequency_in_hz_is_scaled() {
    let config = DeviceConfig::default();
    let mut drive = drive_with(&config, 0);

    drive::write_frequency_hz(&mut drive, &config, 50.0)
        .await
        .unwrap();

    assert_eq!(drive.requests(), &[Request::WriteSingleRegister(101, 5000)]);
}

#[tokio::test]
async fn frequency_in_hz_truncates() {
    let config = DeviceConfig::default();
    let mut drive = drive_with(&config, 0);

    drive::write_frequency_hz(&mut drive, &config, 12.345)
        .await
        .unwrap();

    assert_eq!(drive.requests(), &[Request::WriteSingleRegister(101, 1234)]);
}

#[tokio::test]
async fn raw_setpoint_shows_up_in_telemetry() {
    let config = DeviceConfig::default();
    let mut drive = drive_with(&config, 0);

    drive::write_frequency_setpoint(&mut drive, &config, 3000)
        .await
        .unwrap();
    let telemetry = read_telemetry(&mut drive, &config).await.unwrap();

    assert_eq!(telemetry.set_freq_raw, 3000);
    assert_eq!(telemetry.set_freq_hz, 30.0);
}

#[tokio::test]
async fn control_words() {
    let config = DeviceConfig::default();
    let mut drive = drive_with(&config, 0);

    drive::write_control_word(&mut drive, &config, 0x0012)
        .await
        .unwrap();
    drive::start(&mut drive, &config).await.unwrap();
    drive::stop(&mut drive, &config).await.unwrap();

    assert_eq!(
        drive.requests(),
        &[
            Request::WriteSingleRegister(102, 0x0012),
            Request::WriteSingleRegister(102, 0x0001),
            Request::WriteSingleRegister(102, 0x0000)
        ]
    );
}

#[tokio::test]
async fn clear_fault_writes_one() {
    let config = DeviceConfig::default();
    let mut drive = drive_with(&config, 9);

    assert_eq!(read_telemetry(&mut drive, &config).await.unwrap().fault_code, 9);
    drive.clear_requests();

    drive::clear_fault(&mut drive, &config).await.unwrap();

    assert_eq!(drive.requests(), &[Request::WriteSingleRegister(197, 1)]);
    assert_eq!(read_telemetry(&mut drive, &config).await.unwrap().fault_code, 0);
}

#[tokio::test]
async fn rejected_write_is_an_error() {
    let config = DeviceConfig::default();
    let mut drive = SimulatedDrive::new(config.slave);

    let err = drive::write_control_word(&mut drive, &config, 1)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        TransportError::Exception(Exception::IllegalDataAddress)
    ));
}

#[tokio::test]
async fn unanswered_write_is_an_error() {
    let config = DeviceConfig::default();
    let mut drive = drive_with(&config, 0);
    drive.offline = true;

    assert!(matches!(
        drive::clear_fault(&mut drive, &config).await,
        Err(TransportError::Modbus(_))
    ));
}

#[tokio::test]
async fn holding_image_commands() {
    let config = DeviceConfig::default();
    let mut drive = drive_with(&config, 3);

    for command in Command::from_holding_words(&[0x0001, 4000, 0x0002]) {
        command.execute(&mut drive, &config).await.unwrap();
    }

    assert_eq!(
        drive.requests(),
        &[
            Request::WriteSingleRegister(102, 0x0001),
            Request::WriteSingleRegister(101, 4000),
            Request::WriteSingleRegister(197, 1)
        ]
    );
    let telemetry = read_telemetry(&mut drive, &config).await.unwrap();
    assert_eq!(telemetry.fault_code, 0);
    assert_eq!(telemetry.mirror_words()[2], 4000);
}

#[tokio::test]
async fn out_of_range_slave_is_never_addressed() {
    let config = DeviceConfig::default();
    let mut drive = drive_with(&config, 0);

    for slave in [0, 248] {
        let bad = DeviceConfig {
            slave,
            ..DeviceConfig::default()
        };
        assert!(matches!(
            drive::start(&mut drive, &bad).await,
            Err(TransportError::InvalidSlave(s)) if s == slave
        ));
        assert!(matches!(
            read_telemetry(&mut drive, &bad).await,
            Err(TransportError::InvalidSlave(_))
        ));
    }
    assert!(drive.requests().is_empty());
}
