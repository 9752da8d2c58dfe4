use spice_marshal::logging::{self, info, LogConfig};
use spice_marshal::{
    stats, Cell, Config, DataType, EkAttDsc, EkSegSum, Ellipse, MarshalError, Marshaller,
    ObjectStore, Plane,
};
use std::error::Error;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = Config::discover();
    logging::init_with_config(LogConfig::from(&config.logging).with_env_overrides());

    let store = ObjectStore::with_spice_module(&config.registry);
    let marshaller = Marshaller::new(&store, config.registry.clone());
    info!(module = %config.registry.module, "demo starting");

    for cell in sample_cells()? {
        let label = format!("{:?} cell", cell.data_type());
        let obj = marshaller.encode_cell(&cell.as_cell_ref())?;
        println!("{}: {}", label, store.to_json(&obj));

        let back = marshaller.decode_cell(&obj)?;
        report(&label, back.bytes() == cell.bytes() && back.header() == cell.header());
    }

    let plane = Plane::new([0.0, 0.0, 1.0], 6378.137);
    let obj = marshaller.encode_plane(&plane)?;
    println!("plane: {}", store.to_json(&obj));
    let decoded = marshaller.decode_plane(&obj)?;
    println!("  native: {}", serde_json::to_string(&decoded)?);
    report("plane", decoded == plane);

    let ellipse = Ellipse::new([1.0, 0.0, 0.0], [3.0, 0.0, 0.0], [0.0, 2.0, 0.0]);
    let obj = marshaller.encode_ellipse(&ellipse)?;
    println!("ellipse: {}", store.to_json(&obj));
    let decoded = marshaller.decode_ellipse(&obj)?;
    println!("  native: {}", serde_json::to_string(&decoded)?);
    report("ellipse", decoded == ellipse);

    let summary = sample_segment();
    let obj = marshaller.encode_ek_seg_sum(&summary)?;
    println!("segment summary: {}", store.to_json(&obj));
    let decoded = marshaller.decode_ek_seg_sum(&obj)?;
    println!("  native: {}", serde_json::to_string(&decoded)?);
    report("segment summary", decoded == summary);

    let counters = stats();
    println!(
        "conversions: {}, errors: {}, buffers live: {}",
        counters.conversions,
        counters.marshaling_errors,
        counters.buffers_live()
    );
    Ok(())
}

fn sample_cells() -> Result<Vec<Cell>, MarshalError> {
    let mut doubles = Cell::new(DataType::DoublePrecision, 4, 0)?;
    for value in [3.14, 2.71, -1.0] {
        doubles.append_double(value)?;
    }

    let mut ints = Cell::new(DataType::Integer, 3, 0)?;
    for value in [399, 499, 599] {
        ints.append_int(value)?;
    }
    ints.set_flags(true, false, true);

    let mut names = Cell::new(DataType::Character, 2, 12)?;
    names.append_text("EARTH")?;
    names.append_text("MARS BARYCENTER")?;

    Ok(vec![doubles, ints, names])
}

fn sample_segment() -> EkSegSum {
    EkSegSum {
        tabnam: "SCIENCE_EVENTS".to_string(),
        nrows: 240,
        cnames: vec!["ET".to_string(), "TARGET".to_string()],
        cdescrs: vec![
            EkAttDsc { cclass: 2, dtype: DataType::DoublePrecision.tag(), strlen: 0, size: 1, indexd: true, nullok: false },
            EkAttDsc { cclass: 1, dtype: DataType::Character.tag(), strlen: 32, size: 1, indexd: false, nullok: true },
        ],
    }
}

fn report(label: &str, matched: bool) {
    println!("  {} round trip: {}", label, if matched { "ok" } else { "MISMATCH" });
}
