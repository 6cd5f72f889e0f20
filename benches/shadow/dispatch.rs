use criterion::{Criterion, Throughput};
use libshadow::shadow::payload::decode_state;
use libshadow::shadow::{Event, Native, RawStateHandler, Reported, Shadow, UPDATE_SUCCESS};
use serde::Serialize;
use serde_json::{Value, json};
use std::ffi::{CStr, CString, c_int, c_void};
use std::hint::black_box;

const REPORTED: &str = r#"{"temp":21.5,"humidity":40,"led":{"on":true,"level":3},"tags":["lab","esp32"]}"#;
const DESIRED: &str = r#"{"led":{"on":false,"level":1}}"#;

/// Firmware stand-in that only keeps the handler pair.
struct NullNative {
    handler: Option<(RawStateHandler, *mut c_void)>,
}

impl Native for NullNative {
    fn set_state_handler(&mut self, handler: RawStateHandler, userdata: *mut c_void) {
        self.handler = Some((handler, userdata));
    }

    fn update(&mut self, _version: f64, state: &CStr) -> c_int {
        black_box(state);
        UPDATE_SUCCESS
    }
}

#[derive(Serialize)]
struct Led {
    on: bool,
    level: u8,
}

fn counting_shadow() -> Shadow<NullNative> {
    let mut shadow = Shadow::new(NullNative { handler: None });
    shadow.set_state_handler(
        |count: &mut u64, _event: Event, reported: Value, desired: Value| {
            black_box((reported, desired));
            *count += 1;
            1
        },
        0u64,
    );
    shadow
}

pub fn bench_decode_state(c: &mut Criterion) {
    let mut group = c.benchmark_group("shadow_decode");
    group.throughput(Throughput::Bytes(REPORTED.len() as u64));
    group.bench_function("reported", |b| {
        b.iter(|| decode_state(black_box(REPORTED)).unwrap())
    });
    group.bench_function("empty", |b| b.iter(|| decode_state(black_box("")).unwrap()));
    group.finish();
}

pub fn bench_native_event(c: &mut Criterion) {
    let shadow = counting_shadow();
    let reported = CString::new(REPORTED).unwrap();
    let desired = CString::new(DESIRED).unwrap();

    c.bench_function("shadow_native_event", |b| {
        b.iter(|| {
            let (handler, userdata) = shadow.native().handler.unwrap();
            unsafe {
                handler(
                    userdata,
                    Event::UPDATE_DELTA,
                    reported.as_ptr(),
                    desired.as_ptr(),
                )
            }
        })
    });
}

pub fn bench_update(c: &mut Criterion) {
    let mut shadow = counting_shadow();
    let state = json!({"reported": {"temp": 21.5, "humidity": 40, "led": {"on": true}}});

    c.bench_function("shadow_update", |b| {
        b.iter(|| shadow.update(black_box(0), black_box(&state)))
    });
}

pub fn bench_update_typed(c: &mut Criterion) {
    let mut shadow = counting_shadow();
    let state = Reported {
        reported: Led { on: true, level: 3 },
    };

    c.bench_function("shadow_update_typed", |b| {
        b.iter(|| shadow.update_state(black_box(0), black_box(&state)).unwrap())
    });
}
