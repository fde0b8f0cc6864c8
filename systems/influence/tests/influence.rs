use rampart_core::{Bounds, Vec2};
use rampart_system_influence::{DecayShape, InfluenceMap, InfluenceSource};

fn map() -> InfluenceMap {
    InfluenceMap::new(Bounds::from_size(32.0, 32.0), 1.0).expect("valid map")
}

#[test]
fn linear_decay_matches_closed_form_at_every_cell() {
    let mut map = map();
    let source = InfluenceSource::linear(Vec2::new(16.5, 16.5), 5.0, 7.0);
    map.add_source(&source);

    for sample in map.samples() {
        let distance = sample.position.distance(source.position);
        let expected = if distance <= source.radius {
            source.strength * (1.0 - distance / source.radius)
        } else {
            0.0
        };
        assert!(
            (sample.value - expected).abs() < 1e-4,
            "cell {:?} holds {} instead of {expected}",
            sample.cell,
            sample.value
        );
    }
}

#[test]
fn identical_sources_double_every_value() {
    let source = InfluenceSource {
        position: Vec2::new(9.0, 20.0),
        strength: 3.0,
        radius: 6.0,
        decay: DecayShape::Quadratic,
    };
    let mut single = map();
    single.add_source(&source);
    let mut double = map();
    double.add_source(&source);
    double.add_source(&source);

    for (one, two) in single.cells().iter().zip(double.cells()) {
        assert!((2.0 * one - two).abs() < 1e-5);
    }
}

#[test]
fn values_are_never_negative() {
    let mut map = map();
    for (index, decay) in [DecayShape::Linear, DecayShape::Quadratic, DecayShape::Exponential]
        .into_iter()
        .enumerate()
    {
        map.add_source(&InfluenceSource {
            position: Vec2::new(4.0 + 10.0 * index as f32, 12.0),
            strength: 2.0,
            radius: 9.0,
            decay,
        });
    }
    map.add_source(&InfluenceSource::linear(Vec2::new(5.0, 5.0), -4.0, 3.0));
    map.deposit(Vec2::new(5.0, 5.0), -1.0);

    assert!(map.cells().iter().all(|&value| value >= 0.0));
}

#[test]
fn peaks_dominate_every_neighbour() {
    let mut map = map();
    let centres = [(5.5, 5.5, 3.0), (20.5, 8.5, 6.0), (12.5, 25.5, 4.0), (27.5, 27.5, 6.0)];
    for (x, y, strength) in centres {
        map.add_source(&InfluenceSource::linear(Vec2::new(x, y), strength, 5.0));
    }

    let peaks = map.find_peaks(0.0);
    assert!(!peaks.is_empty());
    for peak in &peaks {
        for dr in -1_i64..=1 {
            for dc in -1_i64..=1 {
                if dc == 0 && dr == 0 {
                    continue;
                }
                let column = i64::from(peak.cell.column()) + dc;
                let row = i64::from(peak.cell.row()) + dr;
                if column < 0 || row < 0 || column >= 32 || row >= 32 {
                    continue;
                }
                let neighbour = map.value(Vec2::new(column as f32 + 0.5, row as f32 + 0.5));
                assert!(
                    peak.value > neighbour,
                    "peak {:?} does not dominate ({column}, {row})",
                    peak.cell
                );
            }
        }
    }
}
