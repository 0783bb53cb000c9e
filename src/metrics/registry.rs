//! Named reports and the metric spec each one runs

use std::fmt;
use std::str::FromStr;

use super::spec::{Dimension, Measure, MetricSpec, SortDirection};
use crate::error::AnalyzerError;
use crate::model::Statistic;

/// Every report the analyzer can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricName {
    VideosPerTag,
    PopularVideosByTag,
    UnpopularVideosByTag,
    TagWithMostVideos,
    TagWithLeastVideos,
    AvgVideoDurationPerTag,
    MostVideoTimeTag,
    LeastVideoTimeTag,
    EngagementPerTag,
    VideosPerCategory,
    PopularVideosByCategory,
    UnpopularVideosByCategory,
    CategoryWithMostVideos,
    CategoryWithLeastVideos,
    AvgVideoDurationPerCategory,
    MostVideoTimeCategory,
    LeastVideoTimeCategory,
    EngagementPerCategory,
    MostViewedTagPerCategory,
    LeastViewedTagPerCategory,
}

impl MetricName {
    pub const ALL: [MetricName; 20] = [
        MetricName::VideosPerTag,
        MetricName::PopularVideosByTag,
        MetricName::UnpopularVideosByTag,
        MetricName::TagWithMostVideos,
        MetricName::TagWithLeastVideos,
        MetricName::AvgVideoDurationPerTag,
        MetricName::MostVideoTimeTag,
        MetricName::LeastVideoTimeTag,
        MetricName::EngagementPerTag,
        MetricName::VideosPerCategory,
        MetricName::PopularVideosByCategory,
        MetricName::UnpopularVideosByCategory,
        MetricName::CategoryWithMostVideos,
        MetricName::CategoryWithLeastVideos,
        MetricName::AvgVideoDurationPerCategory,
        MetricName::MostVideoTimeCategory,
        MetricName::LeastVideoTimeCategory,
        MetricName::EngagementPerCategory,
        MetricName::MostViewedTagPerCategory,
        MetricName::LeastViewedTagPerCategory,
    ];

    pub fn all() -> &'static [MetricName] {
        &Self::ALL
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::VideosPerTag => "videos_per_tag",
            MetricName::PopularVideosByTag => "popular_videos_by_tag",
            MetricName::UnpopularVideosByTag => "unpopular_videos_by_tag",
            MetricName::TagWithMostVideos => "tag_with_most_videos",
            MetricName::TagWithLeastVideos => "tag_with_least_videos",
            MetricName::AvgVideoDurationPerTag => "avg_video_duration_per_tag",
            MetricName::MostVideoTimeTag => "most_video_time_tag",
            MetricName::LeastVideoTimeTag => "least_video_time_tag",
            MetricName::EngagementPerTag => "engagement_per_tag",
            MetricName::VideosPerCategory => "videos_per_category",
            MetricName::PopularVideosByCategory => "popular_videos_by_category",
            MetricName::UnpopularVideosByCategory => "unpopular_videos_by_category",
            MetricName::CategoryWithMostVideos => "category_with_most_videos",
            MetricName::CategoryWithLeastVideos => "category_with_least_videos",
            MetricName::AvgVideoDurationPerCategory => "avg_video_duration_per_category",
            MetricName::MostVideoTimeCategory => "most_video_time_category",
            MetricName::LeastVideoTimeCategory => "least_video_time_category",
            MetricName::EngagementPerCategory => "engagement_per_category",
            MetricName::MostViewedTagPerCategory => "most_viewed_tag_per_category",
            MetricName::LeastViewedTagPerCategory => "least_viewed_tag_per_category",
        }
    }

    /// The aggregation behind this report
    pub fn spec(&self) -> MetricSpec {
        use Dimension::{Category, Tag};
        use SortDirection::{Ascending, Descending};

        let count = |d| MetricSpec::new(d, Measure::DistinctVideoCount);
        let total_time = |d| MetricSpec::new(d, Measure::SumDuration);
        let views = MetricSpec::new(Tag, Measure::SumStatistic(Statistic::Views))
            .per_partition(Category);

        match self {
            MetricName::VideosPerTag => count(Tag),
            MetricName::PopularVideosByTag => count(Tag).sorted(Descending),
            MetricName::UnpopularVideosByTag => count(Tag).sorted(Ascending),
            MetricName::TagWithMostVideos => count(Tag).sorted(Descending).limit(1),
            MetricName::TagWithLeastVideos => count(Tag).sorted(Ascending).limit(1),
            MetricName::AvgVideoDurationPerTag => {
                MetricSpec::new(Tag, Measure::MeanDuration).sorted(Descending)
            }
            MetricName::MostVideoTimeTag => total_time(Tag).sorted(Descending).limit(1),
            MetricName::LeastVideoTimeTag => total_time(Tag).sorted(Ascending).limit(1),
            MetricName::EngagementPerTag => {
                MetricSpec::new(Tag, Measure::Engagement).sorted(Descending)
            }
            MetricName::VideosPerCategory => count(Category),
            MetricName::PopularVideosByCategory => count(Category).sorted(Descending),
            MetricName::UnpopularVideosByCategory => count(Category).sorted(Ascending),
            MetricName::CategoryWithMostVideos => count(Category).sorted(Descending).limit(1),
            MetricName::CategoryWithLeastVideos => count(Category).sorted(Ascending).limit(1),
            MetricName::AvgVideoDurationPerCategory => {
                MetricSpec::new(Category, Measure::MeanDuration).sorted(Descending)
            }
            MetricName::MostVideoTimeCategory => {
                total_time(Category).sorted(Descending).limit(1)
            }
            MetricName::LeastVideoTimeCategory => {
                total_time(Category).sorted(Ascending).limit(1)
            }
            MetricName::EngagementPerCategory => {
                MetricSpec::new(Category, Measure::Engagement).sorted(Descending)
            }
            MetricName::MostViewedTagPerCategory => views.sorted(Descending),
            MetricName::LeastViewedTagPerCategory => views.sorted(Ascending),
        }
    }

    /// Parse every name up front so nothing runs when one is unknown
    pub fn parse_all<S: AsRef<str>>(names: &[S]) -> Result<Vec<MetricName>, AnalyzerError> {
        names.iter().map(|name| name.as_ref().parse()).collect()
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricName {
    type Err = AnalyzerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| AnalyzerError::UnsupportedMetric(s.to_string()))
    }
}
