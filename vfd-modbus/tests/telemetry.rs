use tokio_modbus::{Exception, Request};
use vfd_modbus::{
    drive::read_telemetry,
    registers::{to_protocol_addr, StatusBlock, FAULT_CODE},
    simulator::SimulatedDrive,
    DeviceConfig, ReadFunction, TransportError,
};

fn status() -> StatusBlock {
    StatusBlock {
        status_dir: 0x0003,
        set_freq: 5000,
        running_freq: 4950,
        running_curr: 120,
        dc_bus_volt: 3600,
        temperature: 45,
    }
}

fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-4,
        "expected {expected}, got {actual}"
    );
}

#[tokio::test]
async fn scales_with_default_divisors() {
    let config = DeviceConfig::default();
    let mut drive = SimulatedDrive::vpc_m0701s(&config, status(), 12, ReadFunction::Holding);

    let telemetry = read_telemetry(&mut drive, &config).await.unwrap();

    assert_eq!(telemetry.status_dir, 0x0003);
    assert_eq!(telemetry.set_freq_raw, 5000);
    assert_eq!(telemetry.fault_code, 12);
    assert_close(telemetry.set_freq_hz, 50.0);
    assert_close(telemetry.running_freq_hz, 49.5);
    assert_close(telemetry.running_curr_a, 1.2);
    assert_close(telemetry.dc_bus_volt_v, 360.0);
    assert_close(telemetry.temperature_c, 45.0);
    assert_eq!(
        drive.requests(),
        &[
            Request::ReadHoldingRegisters(179, 6),
            Request::ReadHoldingRegisters(188, 1)
        ]
    );
}

#[tokio::test]
async fn raw_address_configuration() {
    let config = DeviceConfig {
        addr_base: 0,
        read_function: ReadFunction::Input,
        ..DeviceConfig::default()
    };
    let mut drive = SimulatedDrive::vpc_m0701s(&config, status(), 0, ReadFunction::Input);

    read_telemetry(&mut drive, &config).await.unwrap();

    assert_eq!(
        drive.requests(),
        &[
            Request::ReadInputRegisters(40180, 6),
            Request::ReadInputRegisters(40189, 1)
        ]
    );
}

#[tokio::test]
async fn auto_mode_falls_back_to_input_registers() {
    let config = DeviceConfig::default();
    let mut drive = SimulatedDrive::vpc_m0701s(&config, status(), 4, ReadFunction::Input);

    let telemetry = read_telemetry(&mut drive, &config).await.unwrap();

    assert_eq!(telemetry.running_freq_raw, 4950);
    assert_eq!(telemetry.fault_code, 4);
    let block_reads = drive
        .requests()
        .iter()
        .filter(|request| {
            matches!(
                request,
                Request::ReadHoldingRegisters(179, 6) | Request::ReadInputRegisters(179, 6)
            )
        })
        .count();
    assert_eq!(block_reads, 2);
}

#[tokio::test]
async fn both_function_codes_failing_is_an_error() {
    let config = DeviceConfig::default();
    let mut drive = SimulatedDrive::new(config.slave);

    let err = read_telemetry(&mut drive, &config).await.unwrap_err();

    assert!(matches!(
        err,
        TransportError::Exception(Exception::IllegalDataAddress)
    ));
    assert_eq!(
        drive.requests(),
        &[
            Request::ReadHoldingRegisters(179, 6),
            Request::ReadInputRegisters(179, 6)
        ]
    );
}

#[tokio::test]
async fn fixed_function_code_does_not_fall_back() {
    let config = DeviceConfig {
        read_function: ReadFunction::Holding,
        ..DeviceConfig::default()
    };
    let mut drive = SimulatedDrive::vpc_m0701s(&config, status(), 0, ReadFunction::Input);

    assert!(read_telemetry(&mut drive, &config).await.is_err());
    assert_eq!(drive.requests(), &[Request::ReadHoldingRegisters(179, 6)]);
}

#[tokio::test]
async fn fault_code_read_failure_defaults_to_zero() {
    let config = DeviceConfig::default();
    let mut drive = SimulatedDrive::new(config.slave);
    let block = status();
    drive.holding_registers.insert(
        179,
        vec![
            block.status_dir,
            block.set_freq,
            block.running_freq,
            block.running_curr,
            block.dc_bus_volt,
            block.temperature,
        ],
    );

    let telemetry = read_telemetry(&mut drive, &config).await.unwrap();

    assert_eq!(telemetry.fault_code, 0);
    assert_close(telemetry.running_freq_hz, 49.5);
    let fault_addr = to_protocol_addr(FAULT_CODE, config.addr_base);
    assert_eq!(
        &drive.requests()[1..],
        &[
            Request::ReadHoldingRegisters(fault_addr, 1),
            Request::ReadInputRegisters(fault_addr, 1)
        ]
    );
}

#[tokio::test]
async fn offline_drive_is_a_transport_error() {
    let config = DeviceConfig::default();
    let mut drive = SimulatedDrive::vpc_m0701s(&config, status(), 0, ReadFunction::Auto);
    drive.offline = true;

    let err = read_telemetry(&mut drive, &config).await.unwrap_err();

    assert!(matches!(err, TransportError::Modbus(_)));
}

#[tokio::test]
async fn addresses_the_configured_slave() {
    let config = DeviceConfig::new(7).unwrap();
    let mut drive = SimulatedDrive::vpc_m0701s(&config, status(), 0, ReadFunction::Auto);

    assert!(read_telemetry(&mut drive, &config).await.is_ok());

    let other = DeviceConfig::new(8).unwrap();
    assert!(read_telemetry(&mut drive, &other).await.is_err());
}

#[tokio::test]
async fn custom_divisors() {
    let config: vfd_modbus::Config = r#"
devices:
  - slave: 1
    divisors: { frequency: 10, current: 10, voltage: 1, temperature: 10 }
"#
    .parse()
    .unwrap();
    let device = config.device(None).unwrap();
    let mut drive = SimulatedDrive::vpc_m0701s(device, status(), 0, ReadFunction::Auto);

    let telemetry = read_telemetry(&mut drive, device).await.unwrap();

    assert_close(telemetry.set_freq_hz, 500.0);
    assert_close(telemetry.running_curr_a, 12.0);
    assert_close(telemetry.dc_bus_volt_v, 3600.0);
    assert_close(telemetry.temperature_c, 4.5);
}
