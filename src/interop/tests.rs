//! Comprehensive test suite for interop module

use super::*;
use crate::records::{
    Cell, CellHeader, CellRef, DataType, EkAttDsc, EkSegSum, Ellipse, ItemLayout, Plane, RawCell,
    CTRL_SIZE,
};
use crate::runtime::{ClassDef, Handle, ObjectStore};

// Test helpers
fn spice_store() -> ObjectStore {
    ObjectStore::with_spice_module(&RegistryConfig::default())
}

fn new_record<'s>(store: &'s ObjectStore, kind: &str, args: &[Handle<'s>]) -> Handle<'s> {
    let module = store.import_module("spice").unwrap();
    let class = store.attr(&module, kind).unwrap().unwrap();
    store.call(&class, args, &[]).unwrap()
}

fn managed_cell<'s>(store: &'s ObjectStore, dtype: DataType, size: i64) -> Handle<'s> {
    new_record(store, "Cell", &[store.int(dtype.tag() as i64), store.int(size)])
}

fn floats<'s>(store: &'s ObjectStore, values: &[f64]) -> Handle<'s> {
    store.list(values.iter().map(|&v| store.float(v)).collect())
}

fn attr(store: &ObjectStore, obj: &Handle<'_>, name: &str) -> Primitive {
    store.primitive(&store.attr(obj, name).unwrap().unwrap())
}

fn items(store: &ObjectStore, obj: &Handle<'_>, name: &str) -> Vec<Primitive> {
    let list = store.attr(obj, name).unwrap().unwrap();
    (0..store.length(&list).unwrap())
        .map(|i| store.primitive(&store.get_item(&list, i).unwrap().unwrap()))
        .collect()
}

// ============================================================================
// Accessors
// ============================================================================

#[test]
fn test_integer_accessor_accepts_int_and_float() {
    let store = spice_store();
    let host = &store;
    let obj = new_record(&store, "EkAttDsc", &[]);

    store.set_attr(&obj, "size", store.int(3)).unwrap();
    assert_eq!(int_attr(&host, &obj, "size").unwrap(), 3);

    store.set_attr(&obj, "size", store.float(3.0)).unwrap();
    assert_eq!(int_attr(&host, &obj, "size").unwrap(), 3);

    store.set_attr(&obj, "size", store.float(3.7)).unwrap();
    assert_eq!(int_attr(&host, &obj, "size").unwrap(), 3);

    store.set_attr(&obj, "size", store.float(-3.7)).unwrap();
    assert_eq!(int_attr(&host, &obj, "size").unwrap(), -3);
}

#[test]
fn test_integer_accessor_range_checked() {
    let store = spice_store();
    let host = &store;
    let obj = new_record(&store, "EkAttDsc", &[]);

    store.set_attr(&obj, "size", store.float(1e20)).unwrap();
    assert!(matches!(
        int_attr(&host, &obj, "size"),
        Err(MarshalError::AttributeTypeMismatch { .. })
    ));

    store.set_attr(&obj, "size", store.big_int(1 << 70)).unwrap();
    assert!(matches!(
        int_attr(&host, &obj, "size"),
        Err(MarshalError::AttributeTypeMismatch { .. })
    ));
}

#[test]
fn test_number_accessor_priorities() {
    let store = spice_store();
    let host = &store;
    let obj = new_record(&store, "Plane", &[]);

    store.set_attr(&obj, "constant", store.int(2)).unwrap();
    assert_eq!(number_attr(&host, &obj, "constant").unwrap(), 2.0);

    store.set_attr(&obj, "constant", store.big_int(1 << 80)).unwrap();
    assert_eq!(number_attr(&host, &obj, "constant").unwrap(), (1u128 << 80) as f64);

    store.set_attr(&obj, "constant", store.text(b"2")).unwrap();
    assert_eq!(
        number_attr(&host, &obj, "constant"),
        Err(MarshalError::AttributeTypeMismatch {
            attr: "constant".to_string(),
            expected: "float",
            found: "str".to_string(),
        })
    );
}

#[test]
fn test_tag_accessor_rejects_float() {
    let store = spice_store();
    let host = &store;
    let obj = new_record(&store, "EkAttDsc", &[]);

    store.set_attr(&obj, "dtype", store.float(1.0)).unwrap();
    assert!(matches!(
        tag_attr(&host, &obj, "dtype"),
        Err(MarshalError::AttributeTypeMismatch { .. })
    ));
}

#[test]
fn test_bool_accessor_only_accepts_bool() {
    let store = spice_store();
    let host = &store;
    let obj = new_record(&store, "EkAttDsc", &[]);

    assert_eq!(bool_attr(&host, &obj, "nullok"), Ok(false));

    store.set_attr(&obj, "nullok", store.int(1)).unwrap();
    assert!(matches!(
        bool_attr(&host, &obj, "nullok"),
        Err(MarshalError::AttributeTypeMismatch { .. })
    ));
}

#[test]
fn test_missing_attribute() {
    let store = spice_store();
    let host = &store;
    let obj = new_record(&store, "Plane", &[]);
    assert_eq!(
        number_attr(&host, &obj, "radius"),
        Err(MarshalError::missing("radius"))
    );
}

#[test]
fn test_accessor_releases_lookup_reference() {
    let store = spice_store();
    let host = &store;
    let obj = new_record(&store, "Plane", &[]);
    let constant = store.attr(&obj, "constant").unwrap().unwrap();
    let before = store.refcount(&constant);

    number_attr(&host, &obj, "constant").unwrap();
    assert_eq!(store.refcount(&constant), before);
}

// ============================================================================
// Cell decoding
// ============================================================================

#[test]
fn test_decode_double_cell() {
    let store = spice_store();
    let marshaller = Marshaller::with_defaults(&store);

    let obj = managed_cell(&store, DataType::DoublePrecision, 2);
    store.set_attr(&obj, "data", floats(&store, &[3.14, 2.71])).unwrap();
    store.set_attr(&obj, "card", store.int(2)).unwrap();

    let cell = marshaller.decode_cell(&obj).unwrap();
    assert_eq!(cell.data_type(), DataType::DoublePrecision);
    assert_eq!(cell.size(), 2);
    assert_eq!(cell.card(), 2);
    assert_eq!(cell.bytes().len(), (CTRL_SIZE + 2) * 8);

    let view = cell.as_cell_ref();
    for i in 0..CTRL_SIZE {
        assert_eq!(view.double_at(i), 0.0);
    }
    assert_eq!(view.double_at(CTRL_SIZE), 3.14);
    assert_eq!(view.double_at(CTRL_SIZE + 1), 2.71);
}

#[test]
fn test_decode_integer_items_coerced() {
    let store = spice_store();
    let marshaller = Marshaller::with_defaults(&store);

    let obj = managed_cell(&store, DataType::Integer, 3);
    let data = store.list(vec![store.int(3), store.float(3.0), store.big_int(-7)]);
    store.set_attr(&obj, "data", data).unwrap();
    store.set_attr(&obj, "size", store.float(3.0)).unwrap();

    let cell = marshaller.decode_cell(&obj).unwrap();
    let view = cell.as_cell_ref();
    assert_eq!(view.int_at(CTRL_SIZE), 3);
    assert_eq!(view.int_at(CTRL_SIZE + 1), 3);
    assert_eq!(view.int_at(CTRL_SIZE + 2), -7);
}

#[test]
fn test_decode_character_truncates_and_pads() {
    let store = spice_store();
    let marshaller = Marshaller::with_defaults(&store);

    let obj = new_record(&store, "Cell", &[store.int(0), store.int(2), store.int(8)]);
    let data = store.list(vec![store.text(b"abcdefghij"), store.text(b"ab")]);
    store.set_attr(&obj, "data", data).unwrap();

    let cell = marshaller.decode_cell(&obj).unwrap();
    assert_eq!(cell.layout(), ItemLayout::Character { width: 8 });

    let view = cell.as_cell_ref();
    assert_eq!(view.item(CTRL_SIZE), b"abcdefgh");
    assert_eq!(view.item(CTRL_SIZE + 1), b"ab\0\0\0\0\0\0");
    assert_eq!(view.text_at(CTRL_SIZE + 1), b"ab");
}

#[test]
fn test_decode_base_shape_mismatch() {
    let store = spice_store();
    let marshaller = Marshaller::with_defaults(&store);
    let before = stats();

    let obj = managed_cell(&store, DataType::Integer, 1);
    store.set_attr(&obj, "base", store.list((0..5).map(|_| store.int(0)).collect())).unwrap();

    assert_eq!(
        marshaller.decode_cell(&obj).unwrap_err(),
        MarshalError::shape("base", CTRL_SIZE, 5)
    );
    assert_eq!(stats().buffers_allocated, before.buffers_allocated);
}

#[test]
fn test_decode_data_shape_mismatch() {
    let store = spice_store();
    let marshaller = Marshaller::with_defaults(&store);

    let obj = managed_cell(&store, DataType::Integer, 3);
    store.set_attr(&obj, "size", store.int(4)).unwrap();

    assert_eq!(
        marshaller.decode_cell(&obj).unwrap_err(),
        MarshalError::shape("data", 4, 3)
    );
}

#[test]
fn test_decode_card_out_of_range() {
    let store = spice_store();
    let marshaller = Marshaller::with_defaults(&store);

    let obj = managed_cell(&store, DataType::Integer, 2);
    store.set_attr(&obj, "card", store.int(3)).unwrap();
    assert_eq!(
        marshaller.decode_cell(&obj).unwrap_err(),
        MarshalError::shape("card", 2, 3)
    );

    store.set_attr(&obj, "card", store.int(-1)).unwrap();
    assert!(matches!(
        marshaller.decode_cell(&obj),
        Err(MarshalError::ShapeMismatch { .. })
    ));
}

#[test]
fn test_decode_missing_attribute() {
    let store = spice_store();
    let marshaller = Marshaller::with_defaults(&store);
    let plane = new_record(&store, "Plane", &[]);

    assert_eq!(
        marshaller.decode_cell(&plane).unwrap_err(),
        MarshalError::missing("base")
    );
}

#[test]
fn test_decode_flag_type_mismatch() {
    let store = spice_store();
    let marshaller = Marshaller::with_defaults(&store);

    let obj = managed_cell(&store, DataType::Integer, 1);
    store.set_attr(&obj, "isSet", store.int(1)).unwrap();

    assert!(matches!(
        marshaller.decode_cell(&obj),
        Err(MarshalError::AttributeTypeMismatch { ref attr, .. }) if attr == "isSet"
    ));
}

#[test]
fn test_decode_time_and_boolean_unsupported() {
    let store = spice_store();
    let marshaller = Marshaller::with_defaults(&store);
    let before = stats();

    for dtype in [DataType::Time, DataType::Boolean] {
        let obj = managed_cell(&store, dtype, 2);
        assert_eq!(
            marshaller.decode_cell(&obj).unwrap_err(),
            MarshalError::UnsupportedType { tag: dtype.tag() }
        );
    }
    assert_eq!(stats().buffers_allocated, before.buffers_allocated);
}

#[test]
fn test_decode_failure_releases_everything() {
    let store = spice_store();
    let marshaller = Marshaller::with_defaults(&store);

    let obj = managed_cell(&store, DataType::DoublePrecision, 2);
    let data = store.list(vec![store.float(1.0), store.text(b"oops")]);
    store.set_attr(&obj, "data", data).unwrap();

    let live = store.live_objects();
    let refs = store.refcount(&obj);
    let before = stats();

    assert_eq!(
        marshaller.decode_cell(&obj).unwrap_err(),
        MarshalError::ConversionError {
            index: CTRL_SIZE + 1,
            expected: "float",
            found: "str".to_string(),
        }
    );

    let after = stats();
    assert_eq!(after.buffers_allocated, before.buffers_allocated + 1);
    assert_eq!(after.buffers_live(), before.buffers_live());
    assert_eq!(after.marshaling_errors, before.marshaling_errors + 1);
    assert_eq!(store.live_objects(), live);
    assert_eq!(store.refcount(&obj), refs);
}

#[test]
fn test_decode_control_segment_failure_releases_everything() {
    let store = spice_store();
    let marshaller = Marshaller::with_defaults(&store);

    let obj = managed_cell(&store, DataType::Integer, 2);
    let base = store.list(
        (0..CTRL_SIZE)
            .map(|i| if i == 2 { store.text(b"x") } else { store.int(0) })
            .collect(),
    );
    store.set_attr(&obj, "base", base).unwrap();

    let live = store.live_objects();
    let refs = store.refcount(&obj);
    let before = stats();

    assert_eq!(
        marshaller.decode_cell(&obj).unwrap_err(),
        MarshalError::ConversionError {
            index: 2,
            expected: "int",
            found: "str".to_string(),
        }
    );

    let after = stats();
    assert_eq!(after.buffers_allocated, before.buffers_allocated + 1);
    assert_eq!(after.buffers_live(), before.buffers_live());
    assert_eq!(store.live_objects(), live);
    assert_eq!(store.refcount(&obj), refs);
}

#[test]
fn test_decode_text_base_is_not_a_sequence() {
    let store = spice_store();
    let marshaller = Marshaller::with_defaults(&store);

    let obj = managed_cell(&store, DataType::Character, 1);
    store.set_attr(&obj, "base", store.text(b"xxxxxx")).unwrap();
    let before = stats();

    assert_eq!(
        marshaller.decode_cell(&obj).unwrap_err(),
        MarshalError::AttributeTypeMismatch {
            attr: "base".to_string(),
            expected: "sequence",
            found: "str".to_string(),
        }
    );
    assert_eq!(stats().buffers_allocated, before.buffers_allocated);
}

#[test]
fn test_decode_success_keeps_input_refcount() {
    let store = spice_store();
    let marshaller = Marshaller::with_defaults(&store);
    let obj = managed_cell(&store, DataType::Integer, 4);
    let live = store.live_objects();
    let refs = store.refcount(&obj);

    let cell = marshaller.decode_cell(&obj).unwrap();
    assert_eq!(cell.size(), 4);
    assert_eq!(store.live_objects(), live);
    assert_eq!(store.refcount(&obj), refs);
}

#[test]
fn test_decode_empty_data() {
    let store = spice_store();
    let marshaller = Marshaller::with_defaults(&store);
    let obj = managed_cell(&store, DataType::Integer, 0);

    let cell = marshaller.decode_cell(&obj).unwrap();
    assert_eq!(cell.bytes().len(), CTRL_SIZE * 4);
}

// ============================================================================
// Cell encoding
// ============================================================================

#[test]
fn test_encode_integer_cell() {
    let store = spice_store();
    let marshaller = Marshaller::with_defaults(&store);

    let mut cell = Cell::new(DataType::Integer, 3, 0).unwrap();
    cell.append_int(1).unwrap();
    cell.append_int(2).unwrap();
    cell.set_flags(true, false, true);

    let obj = marshaller.encode_cell(&cell.as_cell_ref()).unwrap();
    assert_eq!(attr(&store, &obj, "dtype"), Primitive::Int(2));
    assert_eq!(attr(&store, &obj, "size"), Primitive::Int(3));
    assert_eq!(attr(&store, &obj, "card"), Primitive::Int(2));
    assert_eq!(attr(&store, &obj, "isSet"), Primitive::Bool(true));
    assert_eq!(attr(&store, &obj, "adjust"), Primitive::Bool(false));
    assert_eq!(attr(&store, &obj, "init"), Primitive::Bool(true));
    assert_eq!(items(&store, &obj, "base"), vec![Primitive::Int(0); CTRL_SIZE]);
    assert_eq!(
        items(&store, &obj, "data"),
        vec![Primitive::Int(1), Primitive::Int(2), Primitive::Int(0)]
    );
}

#[test]
fn test_encode_character_stops_at_nul() {
    let store = spice_store();
    let marshaller = Marshaller::with_defaults(&store);

    let mut cell = Cell::new(DataType::Character, 2, 4).unwrap();
    cell.append_text("ab").unwrap();
    cell.append_text("wxyz").unwrap();

    let obj = marshaller.encode_cell(&cell.as_cell_ref()).unwrap();
    assert_eq!(attr(&store, &obj, "length"), Primitive::Int(4));
    assert_eq!(
        items(&store, &obj, "data"),
        vec![Primitive::Text(b"ab".to_vec()), Primitive::Text(b"wxyz".to_vec())]
    );
    assert_eq!(items(&store, &obj, "base")[0], Primitive::Text(Vec::new()));
}

#[test]
fn test_encode_then_decode_round_trip() {
    let store = spice_store();
    let marshaller = Marshaller::with_defaults(&store);

    let mut cell = Cell::new(DataType::DoublePrecision, 3, 0).unwrap();
    cell.append_double(-1.5).unwrap();
    cell.append_double(1e300).unwrap();

    let obj = marshaller.encode_cell(&cell.as_cell_ref()).unwrap();
    let back = marshaller.decode_cell(&obj).unwrap();
    assert_eq!(back.header(), cell.header());
    assert_eq!(back.bytes(), cell.bytes());
}

#[test]
fn test_encode_raw_time_cell_unsupported() {
    let store = spice_store();
    let marshaller = Marshaller::with_defaults(&store);
    let live = store.live_objects();

    let mut storage = vec![0f64; CTRL_SIZE + 1];
    let raw = RawCell {
        dtype: DataType::Time.tag(),
        length: 0,
        size: 1,
        card: 0,
        is_set: 0,
        adjust: 0,
        init: 0,
        base: storage.as_mut_ptr().cast(),
        data: unsafe { storage.as_mut_ptr().add(CTRL_SIZE) }.cast(),
    };

    let err = unsafe { marshaller.encode_raw_cell(&raw) }.unwrap_err();
    assert_eq!(err, MarshalError::UnsupportedType { tag: 3 });
    assert_eq!(store.live_objects(), live);
}

#[test]
fn test_encode_boolean_header_rejected() {
    let header = CellHeader::new(DataType::Boolean, 1, 0);
    let bytes = [0u8; 64];
    assert_eq!(
        CellRef::new(header, &bytes).unwrap_err(),
        MarshalError::UnsupportedType { tag: 4 }
    );
}

#[test]
fn test_encode_raw_cell_from_native() {
    let store = spice_store();
    let marshaller = Marshaller::with_defaults(&store);

    let mut cell = Cell::new(DataType::Integer, 2, 0).unwrap();
    cell.append_int(40).unwrap();
    let raw = cell.as_raw();

    let obj = unsafe { marshaller.encode_raw_cell(&raw) }.unwrap();
    assert_eq!(items(&store, &obj, "data"), vec![Primitive::Int(40), Primitive::Int(0)]);
}

#[test]
fn test_encode_owned_cell_releases_buffer() {
    let store = spice_store();
    let marshaller = Marshaller::with_defaults(&store);
    let before = stats();

    let cell = Cell::new(DataType::Integer, 8, 0).unwrap();
    let obj = marshaller.encode_owned_cell(cell).unwrap();

    let after = stats();
    assert_eq!(after.buffers_allocated, before.buffers_allocated + 1);
    assert_eq!(after.buffers_live(), before.buffers_live());
    assert_eq!(items(&store, &obj, "data").len(), 8);
}

#[test]
fn test_encode_missing_record_kind() {
    let store = spice_store();
    let registry = RegistryConfig {
        cell: "NoSuchCell".to_string(),
        ..RegistryConfig::default()
    };
    let marshaller = Marshaller::new(&store, registry);
    let live = store.live_objects();

    let cell = Cell::new(DataType::Integer, 1, 0).unwrap();
    assert_eq!(
        marshaller.encode_cell(&cell.as_cell_ref()).unwrap_err(),
        MarshalError::missing("spice.NoSuchCell")
    );
    assert_eq!(store.live_objects(), live);
}

#[test]
fn test_encode_failed_construction_releases_arguments() {
    let store = spice_store();
    let registry = RegistryConfig {
        cell: "Plane".to_string(),
        ..RegistryConfig::default()
    };
    let marshaller = Marshaller::new(&store, registry);
    let live = store.live_objects();
    let before = stats();

    let mut cell = Cell::new(DataType::Integer, 2, 0).unwrap();
    cell.append_int(5).unwrap();

    assert_eq!(
        marshaller.encode_cell(&cell.as_cell_ref()).unwrap_err(),
        MarshalError::host("Plane() got an unexpected keyword argument 'lenArg'")
    );
    assert_eq!(store.live_objects(), live);
    assert_eq!(stats().marshaling_errors, before.marshaling_errors + 1);
}

#[test]
fn test_conversion_counter() {
    let store = spice_store();
    let marshaller = Marshaller::with_defaults(&store);
    let before = stats();

    let cell = Cell::new(DataType::Integer, 1, 0).unwrap();
    let _obj = marshaller.encode_cell(&cell.as_cell_ref()).unwrap();
    assert_eq!(stats().conversions, before.conversions + 1);
}

// ============================================================================
// Plane / Ellipse
// ============================================================================

#[test]
fn test_plane_round_trip() {
    let store = spice_store();
    let marshaller = Marshaller::with_defaults(&store);
    let plane = Plane::new([0.0, 0.0, 1.0], 2.5);

    let obj = marshaller.encode_plane(&plane).unwrap();
    let back = marshaller.decode_plane(&obj).unwrap();
    assert_eq!(back, plane);

    let again = marshaller.encode_plane(&back).unwrap();
    assert_eq!(store.to_json(&again), store.to_json(&obj));
}

#[test]
fn test_plane_normal_wrong_length() {
    let store = spice_store();
    let marshaller = Marshaller::with_defaults(&store);
    let obj = new_record(&store, "Plane", &[]);
    store.set_attr(&obj, "normal", floats(&store, &[1.0, 0.0])).unwrap();

    assert_eq!(
        marshaller.decode_plane(&obj).unwrap_err(),
        MarshalError::shape("normal", 3, 2)
    );
}

#[test]
fn test_plane_accepts_integer_components() {
    let store = spice_store();
    let marshaller = Marshaller::with_defaults(&store);
    let normal = store.list(vec![store.int(0), store.int(1), store.float(0.0)]);
    let obj = new_record(&store, "Plane", &[normal, store.int(3)]);

    assert_eq!(
        marshaller.decode_plane(&obj).unwrap(),
        Plane::new([0.0, 1.0, 0.0], 3.0)
    );
}

#[test]
fn test_ellipse_round_trip() {
    let store = spice_store();
    let marshaller = Marshaller::with_defaults(&store);
    let ellipse = Ellipse::new([1.0, 2.0, 3.0], [4.0, 0.0, 0.0], [0.0, 2.0, 0.0]);

    let obj = marshaller.encode_ellipse(&ellipse).unwrap();
    assert_eq!(marshaller.decode_ellipse(&obj).unwrap(), ellipse);
}

#[test]
fn test_ellipse_component_conversion_error() {
    let store = spice_store();
    let marshaller = Marshaller::with_defaults(&store);
    let obj = new_record(&store, "Ellipse", &[]);
    let bad = store.list(vec![store.float(1.0), store.bool(true), store.float(0.0)]);
    store.set_attr(&obj, "semi_minor", bad).unwrap();

    assert_eq!(
        marshaller.decode_ellipse(&obj).unwrap_err(),
        MarshalError::ConversionError {
            index: 1,
            expected: "float",
            found: "bool".to_string(),
        }
    );
}

// ============================================================================
// EK descriptors
// ============================================================================

fn sample_summary() -> EkSegSum {
    EkSegSum {
        tabnam: "EPHEM".to_string(),
        nrows: 4,
        cnames: vec!["ET".to_string(), "NAME".to_string()],
        cdescrs: vec![
            EkAttDsc { cclass: 2, dtype: 1, strlen: 0, size: 1, indexd: true, nullok: false },
            EkAttDsc { cclass: 1, dtype: 0, strlen: 16, size: 1, indexd: false, nullok: true },
        ],
    }
}

#[test]
fn test_ek_seg_sum_round_trip() {
    let store = spice_store();
    let marshaller = Marshaller::with_defaults(&store);
    let summary = sample_summary();

    let obj = marshaller.encode_ek_seg_sum(&summary).unwrap();
    assert_eq!(attr(&store, &obj, "ncols"), Primitive::Int(2));
    assert_eq!(marshaller.decode_ek_seg_sum(&obj).unwrap(), summary);
}

#[test]
fn test_ek_att_dsc_defaults_decode() {
    let store = spice_store();
    let marshaller = Marshaller::with_defaults(&store);
    let obj = new_record(&store, "EkAttDsc", &[]);
    assert_eq!(marshaller.decode_ek_att_dsc(&obj).unwrap(), EkAttDsc::default());
}

fn no_init(_store: &ObjectStore, _this: &Handle<'_>, _args: &[Option<Handle<'_>>]) -> crate::Result<()> {
    Ok(())
}

#[test]
fn test_ek_att_dsc_placeholder_dtype_rejected() {
    let store = spice_store();
    let marshaller = Marshaller::with_defaults(&store);
    let obj = new_record(&store, "EkAttDsc", &[]);

    let placeholder_class = store.class(ClassDef {
        name: "DataType".to_string(),
        params: Vec::new(),
        init: no_init,
    });
    let placeholder = store.call(&placeholder_class, &[], &[]).unwrap();
    store.set_attr(&obj, "dtype", placeholder).unwrap();

    assert_eq!(
        marshaller.decode_ek_att_dsc(&obj).unwrap_err(),
        MarshalError::AttributeTypeMismatch {
            attr: "dtype".to_string(),
            expected: "int",
            found: "DataType".to_string(),
        }
    );
}

#[test]
fn test_ek_seg_sum_column_count_mismatch() {
    let store = spice_store();
    let marshaller = Marshaller::with_defaults(&store);
    let obj = marshaller.encode_ek_seg_sum(&sample_summary()).unwrap();
    store.set_attr(&obj, "ncols", store.int(3)).unwrap();

    assert_eq!(
        marshaller.decode_ek_seg_sum(&obj).unwrap_err(),
        MarshalError::shape("cnames", 3, 2)
    );
}

#[test]
fn test_ek_seg_sum_name_not_text() {
    let store = spice_store();
    let marshaller = Marshaller::with_defaults(&store);
    let obj = marshaller.encode_ek_seg_sum(&sample_summary()).unwrap();
    store.set_attr(&obj, "cnames", store.list(vec![store.text(b"ET"), store.int(5)])).unwrap();

    assert!(matches!(
        marshaller.decode_ek_seg_sum(&obj),
        Err(MarshalError::ConversionError { index: 1, .. })
    ));
}
