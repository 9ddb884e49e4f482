use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    English,
    Turkish,
}

impl Locale {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Turkish => "tr",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Some(Self::English),
            "tr" | "turkish" => Some(Self::Turkish),
            _ => None,
        }
    }

    /// Maps an OS locale tag such as `tr-TR` or `en_US.UTF-8` to a supported
    /// locale; everything that is not Turkish is English.
    pub fn from_tag(tag: &str) -> Self {
        let language = tag
            .split(['-', '_', '.'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        if language == "tr" {
            Self::Turkish
        } else {
            Self::English
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Message {
    pub key: &'static str,
    pub en: &'static str,
    pub tr: Option<&'static str>,
}

impl Message {
    fn text(&self, locale: Locale) -> &'static str {
        match locale {
            Locale::English => self.en,
            Locale::Turkish => self.tr.unwrap_or(self.en),
        }
    }
}

const fn msg(key: &'static str, en: &'static str, tr: &'static str) -> Message {
    Message {
        key,
        en,
        tr: Some(tr),
    }
}

pub const MESSAGES: &[Message] = &[
    msg(
        "SettingUp",
        "Initializing Spicetify Marketplace Installer...",
        "Spicetify Marketplace Yükleyicisi başlatılıyor...",
    ),
    msg("LoggingTo", "Logging to: {0}", "Kayıt dosyası: {0}"),
    msg(
        "SpicetifyNotFound",
        "Spicetify CLI not found. It appears Spicetify is not installed or not in PATH.",
        "Spicetify CLI bulunamadı. Spicetify yüklü değil veya PATH ortam değişkeninde tanımlı değil gibi görünüyor.",
    ),
    msg(
        "InstallingSpicetify",
        "Attempting to install Spicetify CLI...",
        "Spicetify CLI yüklenmeye çalışılıyor...",
    ),
    msg(
        "InstallationFailed",
        "Installation process failed.",
        "Yükleme işlemi başarısız oldu.",
    ),
    msg(
        "SpicetifyCliInstallScriptFin",
        "Spicetify CLI installation script has finished executing.",
        "Spicetify CLI yükleme betiği çalıştırılması tamamlandı.",
    ),
    msg(
        "RunningInstallScript",
        "Executing Spicetify CLI installer script (this may take a moment, automatically answering 'No' to prompts)...",
        "Spicetify CLI yükleme betiği çalıştırılıyor (bu biraz zaman alabilir, istemlere otomatik olarak 'Hayır' yanıtı veriliyor)...",
    ),
    msg(
        "InstallScriptOutput",
        "Installer script output:",
        "Yükleme betiği çıktısı:",
    ),
    msg(
        "SpicetifyInstalledVerified",
        "Spicetify CLI has been installed/verified successfully.",
        "Spicetify CLI başarıyla yüklendi/doğrulandı.",
    ),
    msg(
        "ErrorFromSpicetify",
        "Received error from Spicetify process:",
        "Spicetify işleminden hata alındı:",
    ),
    msg(
        "ErrorRunningSpicetify",
        "An error occurred while trying to run a Spicetify command:",
        "Bir Spicetify komutu çalıştırılırken bir hata oluştu:",
    ),
    msg(
        "FailedToGetSpicetifyPath",
        "CRITICAL ERROR: Failed to determine Spicetify userdata path. Cannot proceed.",
        "KRİTİK HATA: Spicetify kullanıcı verileri yolu belirlenemedi. Devam edilemiyor.",
    ),
    msg(
        "SpicetifyPathCommandOutput",
        "Raw output from 'spicetify path userdata' command:",
        "'spicetify path userdata' komutunun ham çıktısı:",
    ),
    msg(
        "SpicetifyPathInvalidFallback",
        "Warning: Spicetify path command did not yield a valid directory. Using fallback path: {0}",
        "Uyarı: Spicetify yol komutu geçerli bir dizin sağlamadı. Yedek yola geçiliyor: {0}",
    ),
    msg(
        "SpicetifyUserDataPath",
        "Determined Spicetify UserData Path: {0}",
        "Belirlenen Spicetify Kullanıcı Veri Yolu: {0}",
    ),
    msg(
        "RemovingCreatingMarketplaceFolders",
        "Preparing Marketplace directories (removing existing if present, then creating new)...",
        "Marketplace dizinleri hazırlanıyor (mevcutlar varsa kaldırılıyor, ardından yenileri oluşturuluyor)...",
    ),
    msg(
        "ErrorDeletingFolder",
        "Error occurred while deleting directory",
        "Dizin silinirken hata oluştu",
    ),
    msg(
        "DownloadingMarketplace",
        "Downloading latest Spicetify Marketplace release (marketplace.zip)...",
        "En son Spicetify Marketplace sürümü (marketplace.zip) indiriliyor...",
    ),
    msg(
        "UnzippingAndInstalling",
        "Extracting and installing Marketplace files...",
        "Marketplace dosyaları arşivden çıkarılıp yükleniyor...",
    ),
    msg(
        "DetectedExtractedFolder",
        "Detected extracted content in subdirectory: {0} (instead of expected {1})",
        "Çıkarılmış içerik alt dizinde bulundu: {0} (beklenen yerine {1})",
    ),
    msg(
        "FilesExtractedDirectly",
        "Marketplace files appear to be extracted directly into the target application path. No subdirectory move needed.",
        "Marketplace dosyaları doğrudan hedef uygulama yoluna çıkarılmış gibi görünüyor. Alt dizinden taşıma gerekmiyor.",
    ),
    msg(
        "ExpectedFolderNotFound",
        "Warning: Expected extracted content directory '{0}' was not found. Files might be in an unexpected location. If issues persist, consider manual extraction and placement into the CustomApps/marketplace directory.",
        "Uyarı: Beklenen çıkarılmış içerik dizini '{0}' bulunamadı. Dosyalar beklenmedik bir konumda olabilir. Sorun devam ederse, CustomApps/marketplace dizinine manuel çıkarma ve yerleştirmeyi düşünün.",
    ),
    msg(
        "MovingItemsFrom",
        "Moving items from subdirectory '{0}' to Marketplace application root directory...",
        "Öğeler alt dizinden taşınıyor: '{0}' Marketplace uygulama kök dizinine...",
    ),
    msg(
        "ConfiguringSpicetify",
        "Configuring Spicetify for Marketplace (as per official Spicetify guide)...",
        "Marketplace için Spicetify yapılandırılıyor (resmi Spicetify rehberine göre)...",
    ),
    msg(
        "DownloadingPlaceholderTheme",
        "Downloading Marketplace placeholder theme (color.ini)...",
        "Marketplace yer tutucu teması (color.ini) indiriliyor...",
    ),
    msg(
        "LocalThemeFound",
        "An existing Spicetify theme ('{0}') was detected.",
        "Mevcut bir Spicetify teması ('{0}') algılandı.",
    ),
    msg(
        "ReplaceThemePrompt",
        "Do you want to replace it with the Marketplace placeholder theme? This is recommended to easily install themes from Marketplace.",
        "Bunu Marketplace yer tutucu temasıyla değiştirmek istiyor musunuz? Marketplace'ten kolayca tema yüklemek için bu önerilir.",
    ),
    msg("YesPromptChar", "Y", "E"),
    msg("NoPromptChar", "N", "H"),
    msg("YesPromptFull", "Yes", "Evet"),
    msg("NoPromptFull", "No", "Hayır"),
    msg(
        "SettingCurrentThemeMarketplace",
        "Setting current Spicetify theme to 'marketplace'...",
        "Geçerli Spicetify teması 'marketplace' olarak ayarlanıyor...",
    ),
    msg(
        "BackingUpAndApplying",
        "Backing up current Spicetify configuration and applying all changes...",
        "Mevcut Spicetify yapılandırması yedekleniyor ve tüm değişiklikler uygulanıyor...",
    ),
    msg("Done", "Process completed!", "İşlem tamamlandı!"),
    msg(
        "CheckErrors",
        "If Spotify's appearance hasn't changed, please review the messages above for any errors. Also, check 'log.txt' for detailed logs.",
        "Eğer Spotify görünümünde bir değişiklik olmadıysa, lütfen yukarıdaki mesajları olası hatalar için gözden geçirin. Ayrıca, detaylı kayıtlar için 'log.txt' dosyasını kontrol edin.",
    ),
    msg(
        "RestartSpotify",
        "IMPORTANT: Please restart Spotify completely (quit from system tray if running, then reopen) for all changes to take full effect.",
        "ÖNEMLİ: Tüm değişikliklerin tam olarak etkili olması için lütfen Spotify'ı tamamen yeniden başlatın (çalışıyorsa sistem tepsisinden çıkın, sonra tekrar açın).",
    ),
    msg(
        "PressAnyKeyToExit",
        "Press any key to exit this installer.",
        "Bu yükleyiciden çıkmak için herhangi bir tuşa basın.",
    ),
    msg("ErrorLabel", "ERROR:", "HATA:"),
    msg(
        "InstallationCompletePromptTitle",
        "Installation Attempt Finished - Verification Required",
        "Kurulum Denemesi Tamamlandı - Doğrulama Gerekiyor",
    ),
    msg(
        "InstallationCompletePromptQuestion",
        "Was the installation successful and is Marketplace visible in Spotify (after a full restart of Spotify)? (Enter 'N' for force reinstall if not)",
        "Kurulum başarılı oldu mu ve Marketplace Spotify'da (Spotify'ı tam yeniden başlattıktan sonra) görünüyor mu? (Başarısız olduysa, zorla yeniden kurulum için 'H' girin)",
    ),
    msg(
        "GreatSuccess",
        "Excellent! Marketplace should now be available. Exiting installer.",
        "Harika! Marketplace şimdi kullanılabilir olmalı. Yükleyici sonlandırılıyor.",
    ),
    msg(
        "ProceedingWithForceReinstall",
        "Understood. Proceeding with a force reinstall to attempt to resolve potential issues.",
        "Anlaşıldı. Olası sorunları çözmek amacıyla zorla yeniden kurulum ile devam ediliyor.",
    ),
    msg(
        "ForceReinstallStarting",
        "Starting force reinstall process for Spicetify Marketplace...",
        "Spicetify Marketplace için zorla yeniden kurulum işlemi başlatılıyor...",
    ),
    msg(
        "CleaningSpicetifyData",
        "Attempting to clean existing Spicetify data (this includes running 'spicetify restore' and deleting data directories)...",
        "Mevcut Spicetify verileri temizlenmeye çalışılıyor ('spicetify restore' çalıştırılacak ve veri dizinleri silinecektir)...",
    ),
    msg(
        "RunningRestore",
        "Attempting to run 'spicetify restore'...",
        "'spicetify restore' çalıştırılmaya çalışılıyor...",
    ),
    msg("DeletingFolder", "Deleting directory: {0}", "Dizin siliniyor: {0}"),
    msg(
        "SpicetifyFoldersCleaned",
        "Spicetify data directories have been cleaned.",
        "Spicetify veri dizinleri temizlendi.",
    ),
    msg(
        "ErrorCleaningFolders",
        "An error occurred while cleaning Spicetify data directories",
        "Spicetify veri dizinleri temizlenirken bir hata oluştu",
    ),
    msg(
        "DataCleanedAttemptingFreshInstall",
        "Spicetify data cleaned. Now attempting a fresh installation of Spicetify Marketplace...",
        "Spicetify verileri temizlendi. Şimdi Spicetify Marketplace için yeni bir kurulum deneniyor...",
    ),
    msg(
        "AdminRightsDetected",
        "Administrator rights detected or --bypass-admin flag used. The '--bypass-admin' flag will be automatically used for Spicetify commands.",
        "Yönetici hakları algılandı veya --bypass-admin bayrağı kullanıldı. Spicetify komutları için '--bypass-admin' bayrağı otomatik olarak kullanılacak.",
    ),
    msg(
        "DuringForceReinstall",
        "An error occurred during the force reinstall process",
        "Zorla yeniden kurulum işlemi sırasında bir hata oluştu",
    ),
    msg(
        "DuringStandardInstall",
        "An error occurred during the standard install process",
        "Standart kurulum işlemi sırasında bir hata oluştu",
    ),
    msg(
        "SpicetifyCommandFailed",
        "Spicetify command '{0}' failed with exit code {1}.",
        "Spicetify komutu '{0}', {1} çıkış koduyla başarısız oldu.",
    ),
    msg("SpicetifyCommandOutputLog", "Output:", "Çıktı:"),
];

/// Looks up `key` in the built-in table and formats it for `locale`.
pub fn translate(key: &str, locale: Locale, args: &[&dyn Display]) -> String {
    translate_with(MESSAGES, key, locale, args)
}

/// Table lookup with two fallbacks: a message without a translation for
/// `locale` uses English, and an unknown key is returned unchanged.
pub fn translate_with(
    messages: &[Message],
    key: &str,
    locale: Locale,
    args: &[&dyn Display],
) -> String {
    let Some(message) = messages.iter().find(|message| message.key == key) else {
        return key.to_string();
    };
    let template = message.text(locale);
    if args.is_empty() {
        return template.to_string();
    }
    match format_positional(template, args) {
        Some(formatted) => formatted,
        None => format!(
            "{template} (formatting error: {} argument(s) supplied)",
            args.len()
        ),
    }
}

/// Substitutes `{0}`, `{1}`, ... with `args`. Returns `None` when a
/// placeholder refers past the end of `args`.
fn format_positional(template: &str, args: &[&dyn Display]) -> Option<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];
        let Some(close) = after_open.find('}') else {
            out.push_str(&rest[open..]);
            return Some(out);
        };
        match after_open[..close].parse::<usize>() {
            Ok(index) => {
                let arg = args.get(index)?;
                out.push_str(&arg.to_string());
            }
            Err(_) => out.push_str(&rest[open..open + close + 2]),
        }
        rest = &after_open[close + 1..];
    }
    out.push_str(rest);
    Some(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Catalog {
    locale: Locale,
}

impl Catalog {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    pub fn t(self, key: &str) -> String {
        translate(key, self.locale, &[])
    }

    pub fn tf(self, key: &str, args: &[&dyn Display]) -> String {
        translate(key, self.locale, args)
    }

    /// `(Y/N) [Y]` style suffix with the default answer shown in brackets.
    pub fn yes_no_suffix(self, default_yes: bool) -> String {
        let yes = self.t("YesPromptChar");
        let no = self.t("NoPromptChar");
        let default = if default_yes { &yes } else { &no };
        format!("({yes}/{no}) [{}]", default.to_uppercase())
    }

    pub fn is_yes(self, answer: &str) -> bool {
        let answer = answer.trim();
        answer.eq_ignore_ascii_case(&self.t("YesPromptChar"))
            || answer.to_lowercase() == self.t("YesPromptFull").to_lowercase()
    }

    pub fn is_no(self, answer: &str) -> bool {
        let answer = answer.trim();
        answer.eq_ignore_ascii_case(&self.t("NoPromptChar"))
            || answer.to_lowercase() == self.t("NoPromptFull").to_lowercase()
    }
}
