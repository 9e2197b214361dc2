//! Built-in system table. Tier 1 wins ties over tier 4.

use super::catalog::SystemRole;

pub(crate) struct BuiltinSystem {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub tier: u8,
    pub role: SystemRole,
}

const fn independent(name: &'static str, aliases: &'static [&'static str], tier: u8) -> BuiltinSystem {
    BuiltinSystem {
        name,
        aliases,
        tier,
        role: SystemRole::Independent,
    }
}

const fn standard(name: &'static str, aliases: &'static [&'static str], tier: u8) -> BuiltinSystem {
    BuiltinSystem {
        name,
        aliases,
        tier,
        role: SystemRole::Standard,
    }
}

const fn portal(name: &'static str, aliases: &'static [&'static str]) -> BuiltinSystem {
    BuiltinSystem {
        name,
        aliases,
        tier: 4,
        role: SystemRole::AccessPortal,
    }
}

pub(crate) const BUILTIN_SYSTEMS: &[BuiltinSystem] = &[
    // case-handling and government systems
    independent("SIAN", &["sian-portalen"], 1),
    independent("SMIA", &[], 1),
    independent("KOSS", &[], 1),
    independent("Elements", &["elements arkiv"], 1),
    independent("Sofie", &[], 1),
    independent("ESS", &["ess-portalen", "employee self service"], 1),
    independent("Tidbank", &["tid bank", "tidbanken"], 1),
    independent("DVH", &["datavarehus"], 1),
    independent("OBI", &["oracle bi"], 1),
    independent("Aurora", &[], 1),
    independent("Ventus", &[], 1),
    independent("MVA", &["merverdiavgift"], 1),
    independent("Folkeregister", &["folkeregisteret"], 1),
    independent("Skattekort", &["eskattekort", "e-skattekort"], 1),
    independent("Delingstjenester", &[], 1),
    standard("Skatteplikt", &[], 1),
    standard("Argus", &[], 1),
    standard("Lexaurus", &[], 1),
    standard("Begrepskatalogen", &[], 1),
    standard("Teamkatalogen", &[], 1),
    independent("MFA", &[
        "multi-factor authentication",
        "multifactor authentication",
        "multi factor authentication",
        "two-factor authentication",
        "2fa",
        "totp",
        "authenticator app",
        "multifaktor",
    ], 1),
    // Microsoft 365 apps
    independent("Teams", &["ms teams", "microsoft teams", "teams-møte", "teamsmøte", "teams møte"], 2),
    independent("Outlook", &["out look", "microsoft outlook"], 2),
    independent("SharePoint", &["share point", "sharepoint online", "sharepointområde"], 2),
    independent("OneDrive", &["one drive", "onedrive for business"], 2),
    independent("Word", &["microsoft word", "ms word"], 2),
    independent("Excel", &["microsoft excel", "ms excel"], 2),
    independent("PowerPoint", &["power point", "microsoft powerpoint"], 2),
    independent("OneNote", &["one note", "microsoft onenote"], 2),
    independent("Planner", &["microsoft planner"], 2),
    standard("Forms", &["microsoft forms"], 3),
    standard("Loop", &["microsoft loop"], 3),
    standard("Copilot", &["microsoft copilot", "m365 copilot"], 2),
    standard("Authenticator", &["microsoft authenticator"], 2),
    // workplace tools
    independent("Jira", &["jira service desk", "jira service management", "atlassian jira"], 2),
    standard("Confluence", &["atlassian confluence"], 2),
    independent("Remedy", &["bmc remedy"], 2),
    independent("Adobe", &["adobe acrobat", "acrobat reader", "adobe reader"], 2),
    independent("Uniflow", &["uniflow online"], 2),
    independent("Puzzel", &["puzzel contact centre"], 2),
    independent("Phonero", &[], 2),
    standard("Calabrio", &[], 2),
    independent("Mattermost", &[], 2),
    independent("Mural", &[], 2),
    independent("Matomo", &[], 2),
    standard("Balsamiq", &[], 2),
    independent("Autohotkey", &["auto hotkey", "ahk"], 2),
    standard("Pixview", &[], 2),
    standard("Databricks", &[], 2),
    standard("Calendly", &[], 2),
    independent("Unit4", &["unit 4", "unit4 erp"], 2),
    independent("Læringsportalen", &["laeringsportalen"], 2),
    independent("Jabber", &["cisco jabber"], 2),
    standard("Webex", &["webex meetings", "cisco webex"], 2),
    // access and infrastructure
    independent("VPN", &["checkpoint", "check point vpn", "vpn-klient"], 2),
    independent("VDI", &["vmware horizon", "virtuell desktop"], 2),
    independent("Citrix", &["citrix workspace"], 2),
    independent("Omnissa", &["omnissa horizon"], 2),
    independent("Bitlocker", &["bit locker"], 2),
    independent("Jabra", &["jabra direct"], 3),
    standard("Cisco", &["cisco anyconnect"], 3),
    // platforms and devices
    independent("Windows", &["windows 10", "windows 11", "win10", "win11"], 3),
    independent("Mac", &["macos", "mac os", "macbook"], 3),
    independent("Apple", &["apple id"], 3),
    independent("iPhone", &["ios"], 3),
    independent("Android", &["samsung"], 3),
    independent("Mobil", &["mobiltelefon", "mobilabonnement"], 3),
    independent("Edge", &["microsoft edge"], 3),
    independent("Chrome", &["google chrome"], 3),
    standard("Firefox", &["mozilla firefox"], 3),
    independent("Safari", &[], 3),
    standard("Audit", &[], 3),
    standard("Skatteetaten", &["firmaportal"], 3),
    // gateways that must not absorb documents about the systems behind them
    portal("Microsoft", &["micro soft", "office 365", "office365", "microsoft 365", "m365", "o365"]),
    portal("Intranett", &["intranet", "intranettet"]),
    portal("Altinn", &["altinn portal"]),
    portal("Tilgangsportalen", &["min side", "minside", "tilgangsportal"]),
];

/// Nicknames, department names and task words used only by recovery passes.
/// `(keyword, system)`.
pub(crate) const SECONDARY_KEYWORDS: &[(&str, &str)] = &[
    ("e-post", "Outlook"),
    ("epost", "Outlook"),
    ("innboks", "Outlook"),
    ("kalender", "Outlook"),
    ("postkasse", "Outlook"),
    ("kanal", "Teams"),
    ("regneark", "Excel"),
    ("tekstbehandling", "Word"),
    ("presentasjon", "PowerPoint"),
    ("dokumentbibliotek", "SharePoint"),
    ("notatblokk", "OneNote"),
    ("skydrive", "OneDrive"),
    ("namsmyndighetene", "SIAN"),
    ("journalpost", "Elements"),
    ("arkivering", "Elements"),
    ("innkreving", "Sofie"),
    ("reiseregning", "ESS"),
    ("selvbetjening", "ESS"),
    ("timeregistrering", "Tidbank"),
    ("fravær", "Tidbank"),
    ("atlassian", "Jira"),
    ("service desk", "Jira"),
    ("vmware", "VDI"),
    ("horizon", "VDI"),
    ("acrobat", "Adobe"),
    ("check point", "VPN"),
    ("tofaktor", "MFA"),
    ("verifiseringskode", "MFA"),
    ("bekreftelseskode", "MFA"),
    ("datamaskin", "Windows"),
    ("utskrift", "Uniflow"),
    ("skriver", "Uniflow"),
    ("headset", "Jabra"),
    ("hodetelefoner", "Jabra"),
    ("telefonkø", "Puzzel"),
    ("dataverktøy", "DVH"),
    ("lønnsslipp", "Unit4"),
    ("kryptering", "Bitlocker"),
];
