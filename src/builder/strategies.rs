use log::debug;

use super::{BuildContext, BuildError, WindowAccumulator};
use crate::acquisition::{AcquisitionMode, Schema};
use crate::source::{BafVariable, FrameRecord, ProviderError, ScanRange};
use crate::spectrum::{valid_charge, PrecursorInfo};

/// Mode-specific record population.
///
/// A strategy receives one classified frame and pushes zero or more records
/// into the accumulator, in the order they should be emitted.
pub trait RecordStrategy: Sync {
    /// Build the records of `frame`.
    fn populate(
        &self,
        ctx: &BuildContext<'_>,
        frame: &FrameRecord,
        acc: &mut WindowAccumulator,
    ) -> Result<(), BuildError>;
}

impl AcquisitionMode {
    /// The strategy that builds records for this mode.
    pub fn strategy(&self) -> &'static dyn RecordStrategy {
        match self {
            AcquisitionMode::Ms1 => &MS1,
            AcquisitionMode::DdaPasefPrecursor => &DdaPasefStrategy,
            AcquisitionMode::DdaPasefProduct => &AutoMsMsStrategy,
            AcquisitionMode::DiaPasef => &DiaPasefStrategy,
            AcquisitionMode::PrmPasef => &PrmPasefStrategy,
            AcquisitionMode::BbCid => &BB_CID,
            AcquisitionMode::IsCid => &IS_CID,
            AcquisitionMode::Mrm => &MRM,
            AcquisitionMode::MaldiMs1 => &MALDI_MS1,
            AcquisitionMode::MaldiMs2 => &MALDI_MS2,
        }
    }
}

static MS1: SurveyStrategy = SurveyStrategy {
    mode: AcquisitionMode::Ms1,
};
static MALDI_MS1: SurveyStrategy = SurveyStrategy {
    mode: AcquisitionMode::MaldiMs1,
};
static BB_CID: BroadbandStrategy = BroadbandStrategy {
    mode: AcquisitionMode::BbCid,
};
static IS_CID: BroadbandStrategy = BroadbandStrategy {
    mode: AcquisitionMode::IsCid,
};
static MRM: FrameMsMsStrategy = FrameMsMsStrategy {
    mode: AcquisitionMode::Mrm,
    allow_mobility: false,
};
static MALDI_MS2: FrameMsMsStrategy = FrameMsMsStrategy {
    mode: AcquisitionMode::MaldiMs2,
    allow_mobility: true,
};

/// Whole-frame survey spectrum (LC MS1 and MALDI MS1).
struct SurveyStrategy {
    mode: AcquisitionMode,
}

impl RecordStrategy for SurveyStrategy {
    fn populate(
        &self,
        ctx: &BuildContext<'_>,
        frame: &FrameRecord,
        acc: &mut WindowAccumulator,
    ) -> Result<(), BuildError> {
        if ctx.ms2_only {
            return Ok(());
        }
        let header = ctx.header(frame, self.mode)?;
        let extraction = ctx.extractor.extract(frame.id, None, true)?;
        ctx.emit(acc, header, extraction)
    }
}

/// ddaPASEF survey frame followed by one merged product per precursor.
struct DdaPasefStrategy;

impl RecordStrategy for DdaPasefStrategy {
    fn populate(
        &self,
        ctx: &BuildContext<'_>,
        frame: &FrameRecord,
        acc: &mut WindowAccumulator,
    ) -> Result<(), BuildError> {
        if !ctx.ms2_only {
            let header = ctx.header(frame, AcquisitionMode::DdaPasefPrecursor)?;
            let extraction = ctx.extractor.extract(frame.id, None, true)?;
            ctx.emit(acc, header, extraction)?;
        }

        for precursor in ctx.source.precursors(frame.id) {
            let windows = ctx.source.pasef_windows(precursor.id);
            let Some(first) = windows.first() else {
                debug!("Precursor {} of frame {} has no PASEF windows", precursor.id, frame.id);
                acc.drop_empty(frame.id, AcquisitionMode::DdaPasefProduct);
                continue;
            };

            let extraction = ctx.extractor.extract_pasef_precursor(&windows)?;

            // the product inherits the survey frame's retention time and polarity
            let mut header = ctx.header(frame, AcquisitionMode::DdaPasefProduct)?;
            header.frame = first.frame;
            header.parent_frame = Some(precursor.parent);
            header.parent_scan = Some(precursor.scan_number.max(0.0) as u32);

            let mobility = ctx
                .source
                .scan_to_mobility(precursor.parent, &[precursor.scan_number])?
                .first()
                .copied();
            let charge = valid_charge(precursor.charge);

            let mut info = PrecursorInfo::isolation(Some(precursor.average_mz), Some(first.isolation_width));
            info.selected_ion_mz = Some(precursor.largest_peak_mz);
            info.selected_ion_intensity = Some(precursor.intensity);
            info.selected_ion_mobility = mobility;
            info.charge_state = charge;
            info.selected_ion_ccs = ctx.ccs(mobility, charge, precursor.largest_peak_mz);
            info.collision_energy = first.collision_energy;
            header.precursor = Some(info);

            ctx.emit(acc, header, extraction)?;
        }
        Ok(())
    }
}

/// Data-dependent product spectrum of TSF (`FrameMsMsInfo`) or BAF (`Variables`/`Steps`) files.
struct AutoMsMsStrategy;

impl RecordStrategy for AutoMsMsStrategy {
    fn populate(
        &self,
        ctx: &BuildContext<'_>,
        frame: &FrameRecord,
        acc: &mut WindowAccumulator,
    ) -> Result<(), BuildError> {
        let mut header = ctx.header(frame, AcquisitionMode::DdaPasefProduct)?;

        let info = if ctx.schema == Schema::Baf {
            let variable = |v| ctx.source.baf_variable(frame.id, v);
            header.parent_frame = frame.parent;
            let mut info = PrecursorInfo::isolation(
                variable(BafVariable::IsolationTarget),
                variable(BafVariable::IsolationWidth),
            );
            info.selected_ion_mz = ctx.source.baf_step(frame.id).map(|step| step.mass);
            info.charge_state = valid_charge(variable(BafVariable::PrecursorCharge));
            info.collision_energy = variable(BafVariable::CollisionEnergy);
            info
        } else {
            let row = ctx
                .source
                .frame_msms_info(frame.id)
                .ok_or_else(|| ProviderError::missing("FrameMsMsInfo", frame.id))?;
            header.parent_frame = row.parent;
            let mut info = PrecursorInfo::isolation(row.trigger_mass, row.isolation_width);
            info.selected_ion_mz = row.trigger_mass;
            info.charge_state = valid_charge(row.precursor_charge);
            info.collision_energy = row.collision_energy;
            info
        };
        header.precursor = Some(info);

        let extraction = ctx.extractor.extract(frame.id, None, false)?;
        ctx.emit(acc, header, extraction)
    }
}

/// diaPASEF frame split into one record per isolation window.
struct DiaPasefStrategy;

impl RecordStrategy for DiaPasefStrategy {
    fn populate(
        &self,
        ctx: &BuildContext<'_>,
        frame: &FrameRecord,
        acc: &mut WindowAccumulator,
    ) -> Result<(), BuildError> {
        for window in ctx.source.dia_windows(frame.id) {
            let range = ScanRange::new(window.scan_num_begin, window.scan_num_end);
            let extraction = ctx.extractor.extract(frame.id, Some(range), true)?;

            let mut info = PrecursorInfo::isolation(Some(window.isolation_mz), Some(window.isolation_width));
            info.selected_ion_mz = Some(window.isolation_mz);
            info.collision_energy = window.collision_energy;

            let mut header = ctx.header(frame, AcquisitionMode::DiaPasef)?;
            header.precursor = Some(info);
            ctx.emit(acc, header, extraction)?;
        }
        Ok(())
    }
}

/// prmPASEF target isolation, always mobility-collapsed.
struct PrmPasefStrategy;

impl RecordStrategy for PrmPasefStrategy {
    fn populate(
        &self,
        ctx: &BuildContext<'_>,
        frame: &FrameRecord,
        acc: &mut WindowAccumulator,
    ) -> Result<(), BuildError> {
        let row = ctx
            .source
            .prm_frame(frame.id)
            .ok_or_else(|| ProviderError::missing("PrmFrameMsMsInfo", frame.id))?;
        let target = ctx
            .source
            .prm_target(row.target)
            .ok_or_else(|| ProviderError::missing("PrmTargets", row.target))?;

        let range = ScanRange::new(row.scan_num_begin, row.scan_num_end);
        let extraction = ctx.extractor.extract(frame.id, Some(range), false)?;

        let mobility = Some(target.one_over_k0);
        let charge = valid_charge(target.charge);
        let mut info = PrecursorInfo::isolation(Some(row.isolation_mz), Some(row.isolation_width));
        info.selected_ion_mz = Some(row.isolation_mz);
        info.selected_ion_mobility = mobility;
        info.charge_state = charge;
        info.selected_ion_ccs = ctx.ccs(mobility, charge, row.isolation_mz);
        info.collision_energy = row.collision_energy;

        let mut header = ctx.header(frame, AcquisitionMode::PrmPasef)?;
        header.precursor = Some(info);
        ctx.emit(acc, header, extraction)
    }
}

/// bbCID / isCID fragment spectrum with collision energy only.
struct BroadbandStrategy {
    mode: AcquisitionMode,
}

impl RecordStrategy for BroadbandStrategy {
    fn populate(
        &self,
        ctx: &BuildContext<'_>,
        frame: &FrameRecord,
        acc: &mut WindowAccumulator,
    ) -> Result<(), BuildError> {
        let collision_energy = match ctx.schema {
            Schema::Baf => ctx.source.baf_variable(frame.id, BafVariable::CollisionEnergy),
            Schema::Tdf | Schema::Tsf => ctx
                .source
                .frame_msms_info(frame.id)
                .and_then(|row| row.collision_energy),
        };

        let mut header = ctx.header(frame, self.mode)?;
        header.precursor = Some(PrecursorInfo {
            collision_energy,
            ..PrecursorInfo::default()
        });

        let extraction = ctx.extractor.extract(frame.id, None, true)?;
        ctx.emit(acc, header, extraction)
    }
}

/// Fragment spectrum described by `FrameMsMsInfo` without parent linkage (MRM, MALDI MS/MS).
struct FrameMsMsStrategy {
    mode: AcquisitionMode,
    allow_mobility: bool,
}

impl RecordStrategy for FrameMsMsStrategy {
    fn populate(
        &self,
        ctx: &BuildContext<'_>,
        frame: &FrameRecord,
        acc: &mut WindowAccumulator,
    ) -> Result<(), BuildError> {
        let row = ctx
            .source
            .frame_msms_info(frame.id)
            .ok_or_else(|| ProviderError::missing("FrameMsMsInfo", frame.id))?;

        let mut info = PrecursorInfo::isolation(row.trigger_mass, row.isolation_width);
        info.selected_ion_mz = row.trigger_mass;
        info.charge_state = valid_charge(row.precursor_charge);
        info.collision_energy = row.collision_energy;

        let mut header = ctx.header(frame, self.mode)?;
        header.precursor = Some(info);

        let extraction = ctx.extractor.extract(frame.id, None, self.allow_mobility)?;
        ctx.emit(acc, header, extraction)
    }
}
