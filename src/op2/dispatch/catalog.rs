//! The static routing catalog: which table names are skipped, which are
//! framed for a result decoder, and which need a hand-coded handler.
//!
//! The catalog is data. It is loaded into a [`RoutingTable`] once per
//! session, and loading rejects any name listed under two routes.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use log::debug;

use crate::op2::types::error::{Op2Error, Result};
use crate::op2::types::models::{ResultFamily, SpecialTable, TableKind, TableName};

use ResultFamily::*;
use Route::{Geometry as G, Result as R, Special as S};

/// Where a cataloged table name is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Geometry,
    Special(SpecialTable),
    Result(ResultFamily),
}

impl Route {
    fn kind(self) -> TableKind {
        match self {
            Route::Geometry => TableKind::GeometryPasser,
            Route::Special(special) => TableKind::SpecialCase(special),
            Route::Result(family) => TableKind::ResultDecoder(family),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.kind())
    }
}

/// Every table name the reader knows, grouped by route.
#[rustfmt::skip]
pub const STANDARD_CATALOG: &[(&str, Route)] = &[
    // geometry: regular, superelement, old-format and view variants
    ("GEOM1", G), ("GEOM2", G), ("GEOM3", G), ("GEOM4", G),
    ("GEOM1S", G), ("GEOM2S", G), ("GEOM3S", G), ("GEOM4S", G),
    ("GEOM1N", G), ("GEOM1VU", G), ("GEOM2VU", G),
    ("GEOM1OLD", G), ("GEOM2OLD", G), ("GEOM4OLD", G),
    ("EPT", G), ("EPTS", G), ("EPTOLD", G),
    ("EDTS", G),
    ("MPT", G), ("MPTS", G),
    ("PVT0", G), ("CASECC", G),
    ("EDOM", G),
    ("BGPDT", G), ("BGPDTS", G), ("BGPDTOLD", G),
    ("DYNAMIC", G), ("DYNAMICS", G),
    ("EQEXIN", G), ("EQEXINS", G),
    ("GPDT", G), ("ERRORN", G),
    ("DESTAB", G), ("R1TABRG", G), ("HISADD", G),
    ("CONTACT", G), ("VIEWTB", G),
    ("KDICT", G), ("MONITOR", G), ("PERF", G),
    // irregular layouts
    ("DIT", S(SpecialTable::Dit)),
    ("GPL", S(SpecialTable::Gpl)),
    ("MEFF", S(SpecialTable::Meff)),
    ("INTMOD", S(SpecialTable::Intmod)),
    ("OMM2", S(SpecialTable::Omm2)),
    ("FOL", S(SpecialTable::Fol)),
    ("SDF", S(SpecialTable::Sdf)), ("PMRF", S(SpecialTable::Sdf)),
    ("KELM", S(SpecialTable::Kelm)),
    ("PCOMPTS", S(SpecialTable::Pcompts)),
    // stress and strain
    ("OES1X1", R(Oes)), ("OES1", R(Oes)), ("OES1X", R(Oes)), ("OES1C", R(Oes)), ("OESCP", R(Oes)),
    ("OESNLXR", R(Oes)), ("OESNLXD", R(Oes)), ("OESNLBR", R(Oes)), ("OESTRCP", R(Oes)),
    ("OESNL1X", R(Oes)), ("OESRT", R(Oes)),
    ("OSTR1X", R(Oes)), ("OSTR1C", R(Oes)),
    // forces
    ("OEFIT", R(Oef)), ("OEF1X", R(Oef)), ("OEF1", R(Oef)), ("DOEF1", R(Oef)),
    // spc/mpc forces
    ("OQG1", R(Oqg)), ("OQGV1", R(Oqg)), ("OQMG1", R(Oqg)),
    // displacement, velocity, acceleration, eigenvector, temperature
    ("OUG1", R(Oug)), ("OUGV1", R(Oug)), ("BOUGV1", R(Oug)), ("OUPV1", R(Oug)), ("OUGV1PAT", R(Oug)),
    // applied loads
    ("OPG1", R(Opg)), ("OPGV1", R(Opg)), ("OPNL1", R(Opg)),
    ("OGS1", R(Ogs)),
    ("OGPFB1", R(Ogpf)),
    ("ONRGY1", R(Onr)),
    ("OGPWG", R(Ogpwg)), ("OGPWGM", R(Ogpwg)),
    ("LAMA", R(RealEigenvalues)),
    ("BLAMA", R(BucklingEigenvalues)),
    ("CLAMA", R(ComplexEigenvalues)),
    // framed, never decoded
    ("OQP1", R(Passer)),
    ("ROUGV1", R(Passer)), ("TOUGV1", R(Passer)), ("RSOUGV1", R(Passer)),
    ("RESOES1", R(Passer)), ("RESEF1", R(Passer)),
    ("OPG2", R(Passer)),
    ("OFMPF2M", R(Passer)), ("OSMPF2M", R(Passer)), ("OPMPF2M", R(Passer)),
    ("OLMPF2M", R(Passer)), ("OGPMPF2M", R(Passer)),
    ("OAGPSD2", R(Passer)), ("OAGCRM2", R(Passer)), ("OAGRMS2", R(Passer)), ("OAGATO2", R(Passer)), ("OAGNO2", R(Passer)),
    ("OESPSD2", R(Passer)), ("OESCRM2", R(Passer)), ("OESRMS2", R(Passer)), ("OESATO2", R(Passer)), ("OESNO2", R(Passer)),
    ("OEFPSD2", R(Passer)), ("OEFCRM2", R(Passer)), ("OEFRMS2", R(Passer)), ("OEFATO2", R(Passer)), ("OEFNO2", R(Passer)),
    ("OPGPSD2", R(Passer)), ("OPGCRM2", R(Passer)), ("OPGRMS2", R(Passer)), ("OPGATO2", R(Passer)), ("OPGNO2", R(Passer)),
    ("OQGPSD2", R(Passer)), ("OQGCRM2", R(Passer)), ("OQGRMS2", R(Passer)), ("OQGATO2", R(Passer)), ("OQGNO2", R(Passer)),
    ("OQMPSD2", R(Passer)), ("OQMCRM2", R(Passer)), ("OQMRMS2", R(Passer)), ("OQMATO2", R(Passer)), ("OQMNO2", R(Passer)),
    ("OUGPSD2", R(Passer)), ("OUGCRM2", R(Passer)), ("OUGRMS2", R(Passer)), ("OUGATO2", R(Passer)), ("OUGNO2", R(Passer)),
    ("OVGPSD2", R(Passer)), ("OVGCRM2", R(Passer)), ("OVGRMS2", R(Passer)), ("OVGATO2", R(Passer)), ("OVGNO2", R(Passer)),
    ("OSTRPSD2", R(Passer)), ("OSTRCRM2", R(Passer)), ("OSTRRMS2", R(Passer)), ("OSTRATO2", R(Passer)), ("OSTRNO2", R(Passer)),
    ("OCRUG", R(Passer)), ("OCRPG", R(Passer)),
    ("STDISP", R(Passer)),
    ("MATPOOL", R(Passer)), ("CSTM", R(Passer)), ("AXIC", R(Passer)), ("BOPHIG", R(Passer)),
    ("HOEF1", R(Passer)), ("ONRGY2", R(Passer)),
    ("IBULK", R(Passer)), ("FRL", R(Passer)), ("TOL", R(Passer)), ("DSCM2", R(Passer)),
    ("DESCYC", R(Passer)), ("DBCOPT", R(Passer)), ("PVT", R(Passer)), ("XSOP2DIR", R(Passer)),
    ("ONRGY", R(Passer)), ("DSCMCOL", R(Passer)), ("CONTACTS", R(Passer)), ("EDT", R(Passer)),
    ("EXTDB", R(Passer)),
    ("OQG2", R(Passer)), ("OBC1", R(Passer)), ("OBC2", R(Passer)), ("OBG1", R(Passer)),
    ("OES2", R(Passer)), ("OEF2", R(Passer)), ("OUGV2", R(Passer)),
    ("OSPDSI1", R(Passer)), ("OSPDS1", R(Passer)),
    ("OQGCF1", R(Passer)), ("OQGCF2", R(Passer)), ("OQGGF1", R(Passer)), ("OQGGF2", R(Passer)),
    ("OUGRMS1", R(Passer)), ("OESRMS1", R(Passer)), ("OUGNO1", R(Passer)), ("OESNO1", R(Passer)),
    ("OSPDSI2", R(Passer)), ("OSPDS2", R(Passer)), ("OSTR2", R(Passer)), ("OESNLXR2", R(Passer)),
    ("CMODEXT", R(Passer)), ("ROUGV2", R(Passer)), ("CDDATA", R(Passer)), ("OEKE1", R(Passer)),
    ("OES1MX", R(Passer)), ("OESNLBR2", R(Passer)), ("BGPDTVU", R(Passer)),
];

/// Table name to route, built once per session.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    routes: HashMap<TableName, Route>,
}

impl RoutingTable {
    /// Loads [`STANDARD_CATALOG`].
    pub fn standard() -> Result<Self> {
        Self::from_entries(STANDARD_CATALOG.iter().copied())
    }

    /// Loads a catalog. Repeating a name under the same route is harmless;
    /// listing it under two routes is a [`Op2Error::CatalogConflict`].
    pub fn from_entries<'a, I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, Route)>,
    {
        let mut routes: HashMap<TableName, Route> = HashMap::new();
        for (raw, route) in entries {
            let name = TableName::new(raw);
            match routes.get(&name) {
                Some(&existing) if existing == route => {}
                Some(&existing) => {
                    return Err(Op2Error::CatalogConflict {
                        name: name.as_str().to_string(),
                        first: existing.to_string(),
                        second: route.to_string(),
                    });
                }
                None => {
                    routes.insert(name, route);
                }
            }
        }
        debug!("Routing table loaded with {} names", routes.len());
        Ok(RoutingTable { routes })
    }

    pub fn route(&self, name: &TableName) -> Option<Route> {
        self.routes.get(name).copied()
    }

    /// Classifies a table name. Cataloged routes win over the caller's
    /// matrix allow-list.
    pub fn classify(&self, name: &TableName, additional_matrices: &BTreeSet<String>) -> TableKind {
        match self.route(name) {
            Some(route) => route.kind(),
            None if additional_matrices.contains(name.as_str()) => TableKind::AdditionalMatrix,
            None => TableKind::Unknown,
        }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
