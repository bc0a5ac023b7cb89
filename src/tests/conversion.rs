use crate::{
    convert_rinex3_to_rinex2,
    prelude::*,
    tests::toolkit::{check_line_widths, document, init_logger, test_resource},
};

/*
 * Record lines of a legacy file
 */
fn record_lines(content: &str) -> Vec<&str> {
    content
        .lines()
        .skip_while(|l| !l.contains("END OF HEADER"))
        .skip(1)
        .collect()
}

fn header_line<'a>(content: &'a str, label: &str) -> &'a str {
    content
        .lines()
        .find(|l| l[60..].trim_end() == label)
        .unwrap_or_else(|| panic!("missing \"{}\"", label))
}

/*
 * Walks the legacy record, verifying each epoch is followed by
 * as many satellite groups as it declares. Returns the number of epochs.
 */
fn check_completeness(content: &str, num_types: usize) -> usize {
    let lines = record_lines(content);
    let lines_per_sat = (num_types + 4) / 5;
    let mut epochs = 0;
    let mut i = 0;
    while i < lines.len() {
        let numsat = lines[i][29..32].trim().parse::<usize>().unwrap();
        let epoch_lines = (numsat + 11) / 12;
        let mut listed = 0;
        for line in lines[i..i + epoch_lines].iter() {
            listed += line[32..68].trim_end().len() / 3;
        }
        assert_eq!(listed, numsat, "epoch #{}: satellites listed", epochs);
        i += epoch_lines + numsat * lines_per_sat;
        epochs += 1;
    }
    assert_eq!(i, lines.len(), "dangling satellite lines");
    epochs
}

#[test]
fn concrete_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("scen0630.22o");
    let report = convert_rinex3_to_rinex2(
        test_resource("OBS/V3/SCEN00TST_R_20220630000_01D_30S_MO.rnx"),
        &output,
    )
    .unwrap();

    assert!(!report.passthrough);
    assert_eq!(report.epochs, 1);
    assert_eq!(report.observables, 4);

    let content = std::fs::read_to_string(&output).unwrap();
    check_line_widths(&content);

    let version = header_line(&content, "RINEX VERSION / TYPE");
    assert_eq!(&version[..9], "     2.11");
    assert_eq!(&version[20..36], "OBSERVATION DATA");
    assert_eq!(&version[40..41], "G");

    let types = header_line(&content, "# / TYPES OF OBSERV");
    assert_eq!(types[..60].trim_end(), "     4    C1    L1    D1    S1");

    assert_eq!(header_line(&content, "MARKER NAME")[..60].trim_end(), "CAS100ATA");
    assert_eq!(
        header_line(&content, "INTERVAL")[..60].trim_end(),
        "    30.000"
    );

    let rcvr = header_line(&content, "REC # / TYPE / VERS");
    assert_eq!(rcvr[20..40].trim_end(), "SEPT POLARX5");

    let records = record_lines(&content);
    assert_eq!(records.len(), 2);
    assert_eq!(
        records[0].trim_end(),
        " 22  3  4  0  0  0.0000000  0  1G01"
    );
    assert!(records[1].trim_start().starts_with("20000000.000"));
    assert_eq!(
        records[1].trim_end(),
        "  20000000.000   105000000.123        -500.000          45.000"
    );
}

#[test]
fn deterministic_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = test_resource("OBS/V3/CAS100ATA_R_20220630000_01D_30S_MO.rnx");
    let converter = Converter::new(
        ConversionOptions::default().with_systems(&[Constellation::GPS, Constellation::Galileo]),
    );

    let first = dir.path().join("first.22o");
    let second = dir.path().join("second.22o");
    converter.convert(&input, &first).unwrap();
    converter.convert(&input, &second).unwrap();

    assert_eq!(
        std::fs::read(&first).unwrap(),
        std::fs::read(&second).unwrap(),
        "conversion is not deterministic"
    );
}

#[test]
fn mixed_conversion() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("cas10630.22o");
    let converter = Converter::new(
        ConversionOptions::default().with_systems(&[Constellation::GPS, Constellation::Galileo]),
    );
    let report = converter
        .convert(
            test_resource("OBS/V3/CAS100ATA_R_20220630000_01D_30S_MO.rnx"),
            &output,
        )
        .unwrap();

    assert_eq!(report.epochs, 3);
    assert_eq!(report.observables, 9);

    let content = std::fs::read_to_string(&output).unwrap();
    check_line_widths(&content);
    assert_eq!(check_completeness(&content, 9), 3);

    assert_eq!(&header_line(&content, "RINEX VERSION / TYPE")[40..41], "M");
    assert_eq!(
        header_line(&content, "# / TYPES OF OBSERV")[..60].trim_end(),
        "     9    C1    P1    L1    D1    S1    L2    S2    C5    L5"
    );

    let records = record_lines(&content);
    assert_eq!(
        records[0],
        format!(
            "{:<80}",
            " 22  3  4  0  0  0.0000000  0 14G01G03G06G07G09G11G14G17G19G22G28E02"
        )
    );
    assert_eq!(records[1], format!("{:<80}", format!("{:32}E11E36", "")));

    // G01: C1 P1 L1 D1 S1 / L2 S2 C5 L5
    assert_eq!(
        records[2],
        "  20000000.000 7  20000001.500   105000000.000 7     -1234.567          45.250  "
    );
    assert_eq!(
        records[3].trim_end(),
        "  81795000.000          38.500"
    );

    // E02: C1 P1 L1 D1 S1 / L2 S2 C5 L5
    let e02 = 2 + 11 * 2;
    assert_eq!(
        records[e02].trim_end(),
        format!("  23011000.000 8{:16}{:14.3}", "", 120807750.000)
    );
    assert_eq!(
        records[e02 + 1].trim_end(),
        format!("{:32}{:14.3}  {:14.3}", "", 23011002.500, 89742900.000)
    );

    // clock offset
    let epoch1 = 2 + 14 * 2;
    assert_eq!(records[epoch1].len(), 80);
    assert_eq!(
        records[epoch1],
        format!(
            "{:<68}{}",
            " 22  3  4  0  0 30.0000000  0  7G01G03G06G07G09E02E11", " 0.000123457"
        )
    );

    // lock loss flag is transcribed
    let g07 = epoch1 + 1 + 3 * 2;
    assert_eq!(&records[g07][32..48], " 105015064.87117");

    // power failure flag is preserved, events are not transcribed
    let epoch2 = epoch1 + 1 + 7 * 2;
    assert!(records[epoch2].starts_with(" 22  3  4  0  1  0.0000000  1  3G01G03E11"));
}

#[test]
fn gps_only_conversion() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("cas10630.22o");
    let report = convert_rinex3_to_rinex2(
        test_resource("OBS/V3/CAS100ATA_R_20220630000_01D_30S_MO.rnx"),
        &output,
    )
    .unwrap();
    assert_eq!(report.observables, 7);

    let content = std::fs::read_to_string(&output).unwrap();
    check_line_widths(&content);
    assert_eq!(check_completeness(&content, 7), 3);
    assert_eq!(&header_line(&content, "RINEX VERSION / TYPE")[40..41], "G");

    let records = record_lines(&content);
    assert!(records[0].starts_with(" 22  3  4  0  0  0.0000000  0 11G01"));
    assert!(!records[0].contains('E'));

    // G11 misses C1W and L2W: P1 is blank, L2 comes from L2X
    let g11 = 1 + 5 * 2;
    assert_eq!(&records[g11][..32], "  20005000.000 7                ");
    assert!(records[g11 + 1].starts_with("  81814475.250  "));
}

#[test]
fn legacy_passthrough() {
    let dir = tempfile::tempdir().unwrap();
    let input = test_resource("OBS/V2/cas10630.22o");
    let output = dir.path().join("copy.22o");

    let report = convert_rinex3_to_rinex2(&input, &output).unwrap();
    assert!(report.passthrough);
    assert_eq!(
        std::fs::read(&input).unwrap(),
        std::fs::read(&output).unwrap()
    );

    let output = dir.path().join("rejected.22o");
    let converter = Converter::new(ConversionOptions::default().with_legacy_passthrough(false));
    assert!(matches!(
        converter.convert(&input, &output),
        Err(Error::MalformedHeader { .. })
    ));
    assert!(!output.exists());
}

#[test]
fn no_partial_output() {
    let dir = tempfile::tempdir().unwrap();

    // malformed input: nothing is produced
    let output = dir.path().join("malf0630.22o");
    assert!(convert_rinex3_to_rinex2(
        test_resource("OBS/V3/MALF00TST_R_20220630000_01D_30S_MO.rnx"),
        &output
    )
    .is_err());
    assert!(!output.exists());

    // overflow half way through the record: output is rolled back
    let doc = document(
        &[("G", &["C1C", "L1C"])],
        &[
            &[("G01", &[Some(20000000.0), Some(105000000.0)])],
            &[("G01", &[Some(20000000.0), Some(1.0E15)])],
        ],
    );
    let output = dir.path().join("overflow.22o");
    match Rinex2Writer::default().write(&doc, &output) {
        Err(Error::FieldOverflow { field, .. }) => assert_eq!(field, "G01 observation #2"),
        other => panic!("unexpected result {:?}", other),
    }
    assert!(!output.exists());

    // failed write over a previous output: previous output is preserved
    let output = dir.path().join("previous.22o");
    std::fs::write(&output, "previous good file\n").unwrap();
    assert!(Rinex2Writer::default().write(&doc, &output).is_err());
    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "previous good file\n"
    );

    // semantically empty document
    let doc = document(&[("G", &["C1C", "L1C"])], &[]);
    assert!(matches!(
        Converter::default().validate(&doc),
        Err(Error::EmptyDocument(_))
    ));
}

#[test]
fn in_place_conversion() {
    let dir = tempfile::tempdir().unwrap();

    // legacy file copied onto itself
    let original = std::fs::read(test_resource("OBS/V2/cas10630.22o")).unwrap();
    let path = dir.path().join("cas10630.22o");
    std::fs::write(&path, &original).unwrap();
    let report = Converter::default().convert(&path, &path).unwrap();
    assert!(report.passthrough);
    assert_eq!(std::fs::read(&path).unwrap(), original);

    // modern file replaced by its legacy counterpart
    let path = dir.path().join("cas10630.rnx");
    std::fs::copy(
        test_resource("OBS/V3/CAS100ATA_R_20220630000_01D_30S_MO.rnx"),
        &path,
    )
    .unwrap();
    let report = Converter::default().convert(&path, &path).unwrap();
    assert_eq!(report.epochs, 3);
    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(&header_line(&content, "RINEX VERSION / TYPE")[..9], "     2.11");

    // failed conversion leaves the input untouched
    let path = dir.path().join("malf.rnx");
    let original =
        std::fs::read(test_resource("OBS/V3/MALF00TST_R_20220630000_01D_30S_MO.rnx")).unwrap();
    std::fs::write(&path, &original).unwrap();
    assert!(Converter::default().convert(&path, &path).is_err());
    assert_eq!(std::fs::read(&path).unwrap(), original);

    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 3);
}
