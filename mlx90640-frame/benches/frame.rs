use criterion::{criterion_group, criterion_main, Criterion};

use mlx90640_frame::common::{DEFAULT_ADDRESS, EEPROM_BASE, EEPROM_WORDS};
use mlx90640_frame::{Config, Mlx90640Camera, RegisterAccess};
use mlx90640_frame_test_data::{fixture_mlx90640_at_address, FixtureProcessor};

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("MLX90640");

    group.bench_function("EEPROM read", |b| {
        let mock = fixture_mlx90640_at_address(DEFAULT_ADDRESS);
        let mut access = RegisterAccess::new(mock.clone(), DEFAULT_ADDRESS);
        let mut eeprom = [0u16; EEPROM_WORDS];
        b.iter(|| {
            mock.clear_operations();
            access.read(EEPROM_BASE, &mut eeprom)
        })
    });

    group.bench_function("Frame", |b| {
        let mock = fixture_mlx90640_at_address(DEFAULT_ADDRESS);
        let mut camera = Mlx90640Camera::init(mock.clone(), FixtureProcessor, &Config::default())
            .unwrap_or_else(|err| panic!("Initialization failed: {:?}", err));
        b.iter(|| {
            mock.clear_operations();
            mock.set_data_available(true);
            camera.frame().map(|temperatures| temperatures[0])
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
