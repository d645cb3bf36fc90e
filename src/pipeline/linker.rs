use std::collections::HashMap;

use crate::spectrum::CanonicalSpectrum;

/// A record in emission order with the position of its parent, if linked.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedRecord {
    /// The record
    pub spectrum: CanonicalSpectrum,
    /// Index (within the same linked window) of the parent MS1 record
    pub parent: Option<usize>,
}

/// Order one window's records parent-then-children.
///
/// Records keep production order, except that a product whose parent MS1
/// record is present in the window moves directly behind that parent, after
/// any earlier children. Products whose parent is absent stay where they were
/// produced and carry no reference.
pub fn link(records: Vec<CanonicalSpectrum>) -> Vec<LinkedRecord> {
    let mut parents: HashMap<u32, usize> = HashMap::new();
    for (index, record) in records.iter().enumerate() {
        if record.ms_level() == 1 {
            parents.entry(record.frame()).or_insert(index);
        }
    }

    let mut children: HashMap<usize, Vec<usize>> = HashMap::new();
    let mut standalone = vec![true; records.len()];
    for (index, record) in records.iter().enumerate() {
        if record.ms_level() == 1 {
            continue;
        }
        if let Some(&parent) = record.parent_frame().and_then(|frame| parents.get(&frame)) {
            children.entry(parent).or_default().push(index);
            standalone[index] = false;
        }
    }

    let mut order: Vec<(usize, Option<usize>)> = Vec::with_capacity(records.len());
    for index in 0..records.len() {
        if !standalone[index] {
            continue;
        }
        let position = order.len();
        order.push((index, None));
        if let Some(kids) = children.get(&index) {
            order.extend(kids.iter().map(|&kid| (kid, Some(position))));
        }
    }

    let mut slots: Vec<Option<CanonicalSpectrum>> = records.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|(index, parent)| {
            slots[index]
                .take()
                .map(|spectrum| LinkedRecord { spectrum, parent })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::AcquisitionMode;
    use crate::spectrum::{Polarity, SpectrumArrays, SpectrumHeader};

    fn record(frame: u32, mode: AcquisitionMode, parent: Option<u32>) -> CanonicalSpectrum {
        let mut header = SpectrumHeader::new(frame, mode, Polarity::Positive, true);
        header.parent_frame = parent;
        CanonicalSpectrum::new(header, SpectrumArrays::new(vec![100.0], vec![1.0])).unwrap()
    }

    fn frames(linked: &[LinkedRecord]) -> Vec<(u32, Option<usize>)> {
        linked.iter().map(|r| (r.spectrum.frame(), r.parent)).collect()
    }

    #[test]
    fn test_parent_then_two_products() {
        let records = vec![
            record(1, AcquisitionMode::Ms1, None),
            record(2, AcquisitionMode::DdaPasefProduct, Some(1)),
            record(3, AcquisitionMode::DdaPasefProduct, Some(1)),
        ];
        let linked = link(records);
        assert_eq!(frames(&linked), vec![(1, None), (2, Some(0)), (3, Some(0))]);
    }

    #[test]
    fn test_children_move_behind_their_parent() {
        let records = vec![
            record(1, AcquisitionMode::Ms1, None),
            record(5, AcquisitionMode::Ms1, None),
            record(2, AcquisitionMode::DdaPasefProduct, Some(1)),
            record(6, AcquisitionMode::DdaPasefProduct, Some(5)),
            record(3, AcquisitionMode::DdaPasefProduct, Some(1)),
        ];
        let linked = link(records);
        assert_eq!(
            frames(&linked),
            vec![(1, None), (2, Some(0)), (3, Some(0)), (5, None), (6, Some(3))]
        );
    }

    #[test]
    fn test_orphans_keep_position_without_reference() {
        let records = vec![
            record(10, AcquisitionMode::DdaPasefProduct, Some(9)),
            record(11, AcquisitionMode::Ms1, None),
            record(12, AcquisitionMode::BbCid, None),
        ];
        let linked = link(records);
        assert_eq!(frames(&linked), vec![(10, None), (11, None), (12, None)]);
    }

    #[test]
    fn test_pasef_products_link_to_survey_frame() {
        // a ddaPASEF product read from frame 4 refers to survey frame 3
        let records = vec![
            record(3, AcquisitionMode::DdaPasefPrecursor, None),
            record(4, AcquisitionMode::DdaPasefProduct, Some(3)),
        ];
        let linked = link(records);
        assert_eq!(linked[1].parent, Some(0));
        assert_eq!(linked.len(), 2);
    }
}
