//! End-to-end test: identification through per-cycle event derivation

use car_interface::{
    brand_for, Actuators, AlertFlags, CanFrame, CarCommand, CarInterface, EventKind,
    FingerprintSample, FingerprintTable, Result, SignalSnapshot,
};

#[derive(Default)]
struct RecordingChannel {
    frames: Vec<u64>,
}

impl car_interface::ActuationChannel for RecordingChannel {
    fn send(
        &mut self,
        frame: u64,
        _actuators: &Actuators,
        _alerts: &AlertFlags,
        _cruise_cancel: bool,
    ) -> Result<()> {
        self.frames.push(frame);
        Ok(())
    }
}

fn driving_snapshot(kph: f64, cruise_engaged: bool, comm_valid: bool) -> SignalSnapshot {
    SignalSnapshot {
        wheel_speed_fl: kph,
        wheel_speed_fr: kph,
        wheel_speed_rl: kph,
        wheel_speed_rr: kph,
        cruise_status: u8::from(cruise_engaged),
        cruise_speed: kph,
        main_on: true,
        doors_closed: true,
        seatbelt_latched: true,
        comm_valid,
        ..Default::default()
    }
}

fn kinds(out: &car_interface::CycleOutput) -> Vec<EventKind> {
    out.events.iter().map(|e| e.kind).collect()
}

#[test]
fn identify_then_drive() {
    let table = FingerprintTable::load(None).unwrap();

    // Shared platform traffic first, an off-bus echo that must not
    // eliminate anyone, then the RAV4-only powertrain message
    let traffic = vec![
        CanFrame::new(1024, 0, 5),
        CanFrame::new(800, 0, 8),
        CanFrame::new(464, 0, 8),
        CanFrame::new(36, 2, 1),
        CanFrame::new(36, 0, 8),
    ];
    let ident = table.identify(traffic, 1000).expect("RAV4 traffic must resolve");
    assert_eq!(ident.model, "TOYOTA RAV4 2017");
    assert_eq!(ident.frames, 5);

    // Neither optional-ECU heartbeat showed up before resolution, so this
    // layer owns the longitudinal gate
    let mut interface = CarInterface::from_identification(&ident, RecordingChannel::default())
        .expect("identified model must build");
    assert!(!interface.params().camera_present);
    assert!(!interface.params().drive_support_present);
    assert!(interface.params().longitudinal_gating);

    let command = CarCommand::default();

    // Cruise off, then engaged: the enable edge fires exactly once.
    // 40 km/h is above the RAV4 minimum enable speed.
    let out = interface.update(&driving_snapshot(40.0, false, true), &command);
    assert!(kinds(&out).contains(&EventKind::PcmDisable));
    assert!(!kinds(&out).contains(&EventKind::SpeedTooLow));

    let out = interface.update(&driving_snapshot(40.0, true, true), &command);
    assert!(kinds(&out).contains(&EventKind::PcmEnable));

    let out = interface.update(&driving_snapshot(40.0, true, true), &command);
    assert!(!kinds(&out).contains(&EventKind::PcmEnable));

    // Communication drops: commIssue only from the fifth invalid cycle
    for n in 1..=6 {
        let out = interface.update(&driving_snapshot(40.0, true, false), &command);
        assert_eq!(
            kinds(&out).contains(&EventKind::CommIssue),
            n >= 5,
            "invalid cycle {}",
            n
        );
    }

    // Validity returns, the streak clears
    let out = interface.update(&driving_snapshot(40.0, true, true), &command);
    assert!(!kinds(&out).contains(&EventKind::CommIssue));
    assert_eq!(interface.memory().cycle, 10);

    // Actuation side: one frame per apply, numbered from zero
    interface.apply(&command).unwrap();
    interface.apply(&command).unwrap();
    assert_eq!(interface.channel().frames, vec![0, 1]);
}

#[test]
fn full_sample_reports_stock_ecus() {
    // With the whole reference fingerprint observed, both optional-ECU
    // heartbeats are in the sample and the stock units keep the gate
    let table = FingerprintTable::load(None).unwrap();
    let sample: FingerprintSample = table
        .model_fingerprint("TOYOTA RAV4 2017")
        .unwrap()
        .iter()
        .map(|(a, l)| (*a, *l))
        .collect();

    let brand = brand_for("TOYOTA RAV4 2017").unwrap();
    let params = brand.derive_params("TOYOTA RAV4 2017", &sample).unwrap();
    assert!(params.camera_present);
    assert!(params.drive_support_present);
    assert!(!params.longitudinal_gating);
}

#[test]
fn unknown_vehicle_fails_identification() {
    let table = FingerprintTable::load(None).unwrap();
    let frames = vec![CanFrame::new(0x7ff, 0, 8)];
    assert!(table.identify(frames, 10).is_err());
}
