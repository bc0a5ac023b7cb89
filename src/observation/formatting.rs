//! RINEX 2 observation record formatting
use std::io::{BufWriter, Write};

use crate::{
    epoch::format_v2 as epoch_format,
    observation::{EpochFlag, ObservationValue},
    prelude::{Epoch, Error, SatelliteId},
};

/// Every record line is padded to this width
pub(crate) const LINE_WIDTH: usize = 80;

const NUM_SV_PER_LINE: usize = 12;
const OBSERVATIONS_PER_LINE: usize = 5;
const NEW_LINE_PADDING: &str = "                                ";
const BLANKING: &str = "                ";

/*
 * Writes one record line, padded to 80 columns
 */
fn write_line<W: Write>(w: &mut BufWriter<W>, content: &str) -> Result<(), Error> {
    writeln!(w, "{:<width$}", content, width = LINE_WIDTH)?;
    Ok(())
}

fn format_sv(sv: &SatelliteId) -> Result<String, Error> {
    if sv.prn > 99 {
        return Err(Error::FieldOverflow {
            field: "satellite number".to_string(),
            value: sv.prn.to_string(),
        });
    }
    Ok(sv.to_string())
}

/// Formats a legacy epoch descriptor: timestamp, flag, number of satellites,
/// satellites packed 12 per line, and the receiver clock offset (F12.9)
/// in columns 69-80 of the first line.
pub(crate) fn format_epoch_v2<W: Write>(
    w: &mut BufWriter<W>,
    epoch: Epoch,
    flag: EpochFlag,
    sv_list: &[SatelliteId],
    clock_offset: Option<f64>,
) -> Result<(), Error> {
    let numsat = sv_list.len();
    if numsat > 999 {
        return Err(Error::FieldOverflow {
            field: "number of satellites".to_string(),
            value: numsat.to_string(),
        });
    }

    let mut line = format!("{}  {}{:3}", epoch_format(epoch), flag, numsat);

    for (nth, sv) in sv_list.iter().enumerate() {
        if nth > 0 && nth % NUM_SV_PER_LINE == 0 {
            if nth == NUM_SV_PER_LINE {
                if let Some(offset) = clock_offset {
                    line = format!("{:<68}{}", line, format_clock_offset(offset)?);
                }
            }
            write_line(w, &line)?;
            line = NEW_LINE_PADDING.to_string();
        }
        line.push_str(&format_sv(sv)?);
    }

    if numsat <= NUM_SV_PER_LINE {
        if let Some(offset) = clock_offset {
            line = format!("{:<68}{}", line, format_clock_offset(offset)?);
        }
    }

    write_line(w, &line)
}

fn format_clock_offset(offset: f64) -> Result<String, Error> {
    let formatted = format!("{:12.9}", offset);
    if formatted.len() > 12 {
        return Err(Error::FieldOverflow {
            field: "receiver clock offset".to_string(),
            value: offset.to_string(),
        });
    }
    Ok(formatted)
}

/// Formats the observations of one satellite, one slot per legacy observable,
/// 5 slots per line. Absent observations are blanked.
pub(crate) fn format_observations_v2<W: Write>(
    w: &mut BufWriter<W>,
    sv: &SatelliteId,
    slots: &[Option<ObservationValue>],
) -> Result<(), Error> {
    let mut line = String::with_capacity(LINE_WIDTH);

    for (nth, slot) in slots.iter().enumerate() {
        match slot {
            Some(observation) => {
                let value = format!("{:14.3}", observation.value);
                if value.len() > 14 || !observation.value.is_finite() {
                    return Err(Error::FieldOverflow {
                        field: format!("{} observation #{}", sv, nth + 1),
                        value: observation.value.to_string(),
                    });
                }
                line.push_str(&value);
                match observation.lli {
                    Some(lli) => line.push_str(&lli.bits().to_string()),
                    None => line.push(' '),
                }
                match observation.snr {
                    Some(snr) if snr < 10 => line.push_str(&snr.to_string()),
                    _ => line.push(' '),
                }
            },
            None => line.push_str(BLANKING),
        }

        if nth % OBSERVATIONS_PER_LINE == OBSERVATIONS_PER_LINE - 1 {
            write_line(w, &line)?;
            line.clear();
        }
    }

    if slots.is_empty() || !line.is_empty() {
        write_line(w, &line)?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::observation::LliFlags;
    use crate::prelude::Constellation;
    use std::str::FromStr;

    fn formatted<F: FnOnce(&mut BufWriter<Vec<u8>>) -> Result<(), Error>>(f: F) -> String {
        let mut buf = BufWriter::new(Vec::new());
        f(&mut buf).unwrap();
        String::from_utf8(buf.into_inner().unwrap()).unwrap()
    }

    fn gps(prn: u8) -> SatelliteId {
        SatelliteId::new(Constellation::GPS, prn)
    }

    #[test]
    fn epoch_descriptor() {
        let epoch = Epoch::from_str("2022-03-04T00:00:30 GPST").unwrap();
        let content = formatted(|w| {
            format_epoch_v2(w, epoch, EpochFlag::Ok, &[gps(1), gps(12), gps(24)], None)
        });
        let lines = content.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), 80);
        assert_eq!(
            lines[0].trim_end(),
            " 22  3  4  0  0 30.0000000  0  3G01G12G24"
        );
    }

    #[test]
    fn epoch_continuation() {
        let epoch = Epoch::from_str("2022-03-04T00:00:30 GPST").unwrap();
        let sv_list = (1..=14).map(gps).collect::<Vec<_>>();
        let content = formatted(|w| {
            format_epoch_v2(w, epoch, EpochFlag::Ok, &sv_list, Some(-0.000123456))
        });
        let lines = content.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        for line in lines.iter() {
            assert_eq!(line.len(), 80);
        }
        assert!(lines[0].starts_with(" 22  3  4  0  0 30.0000000  0 14G01G02"));
        assert_eq!(&lines[0][32..68], "G01G02G03G04G05G06G07G08G09G10G11G12");
        assert_eq!(&lines[0][68..], "-0.000123456");
        assert_eq!(lines[1].trim_end(), format!("{}G13G14", NEW_LINE_PADDING));
    }

    #[test]
    fn clock_offset_overflow() {
        let epoch = Epoch::from_str("2022-03-04T00:00:30 GPST").unwrap();
        let mut buf = BufWriter::new(Vec::new());
        let result = format_epoch_v2(&mut buf, epoch, EpochFlag::Ok, &[gps(1)], Some(123.0));
        assert!(matches!(result, Err(Error::FieldOverflow { .. })));
    }

    #[test]
    fn observations() {
        let slots = vec![
            Some(ObservationValue::new(20000000.0)),
            Some(
                ObservationValue::new(105000000.123)
                    .with_lli(LliFlags::LOCK_LOSS)
                    .with_snr(7),
            ),
            None,
            Some(ObservationValue::new(45.0)),
            None,
            Some(ObservationValue::new(-500.0)),
        ];
        let content = formatted(|w| format_observations_v2(w, &gps(1), &slots));
        let lines = content.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].len(), 80);
        assert_eq!(lines[1].len(), 80);
        assert_eq!(&lines[0][0..16], "  20000000.000  ");
        assert_eq!(&lines[0][16..32], " 105000000.12317");
        assert_eq!(&lines[0][32..48], BLANKING);
        assert_eq!(&lines[0][48..64], "        45.000  ");
        assert_eq!(&lines[1][0..16], "      -500.000  ");
    }

    #[test]
    fn observation_overflow() {
        let mut buf = BufWriter::new(Vec::new());
        let slots = vec![Some(ObservationValue::new(1.0E12))];
        let result = format_observations_v2(&mut buf, &gps(1), &slots);
        assert!(matches!(result, Err(Error::FieldOverflow { .. })));
    }
}
